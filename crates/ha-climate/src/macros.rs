/// Declares a closed, string-valued climate enum
///
/// Each variant has a wire string and optionally an integer code. The
/// generated type implements [`ClimateEnum`](crate::ClimateEnum), `FromStr`,
/// `Display`, `TryFrom<&serde_json::Value>` and string serde.
macro_rules! climate_enum {
    (@code) => { None };
    (@code $code:literal) => { Some($code) };

    (
        $(#[$meta:meta])*
        pub enum $name:ident ($kind:literal) {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $wire:literal $(= $code:literal)?
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $crate::ClimateEnum for $name {
            const KIND: &'static str = $kind;
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }

            fn code(&self) -> Option<u8> {
                match self {
                    $(Self::$variant => climate_enum!(@code $($code)?),)+
                }
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::ClimateError;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                <Self as $crate::ClimateEnum>::parse(raw)
            }
        }

        impl TryFrom<&::serde_json::Value> for $name {
            type Error = $crate::ClimateError;

            fn try_from(raw: &::serde_json::Value) -> Result<Self, Self::Error> {
                <Self as $crate::ClimateEnum>::coerce(raw)
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::ClimateEnum::as_str(self))
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str($crate::ClimateEnum::as_str(self))
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = <::serde_json::Value as ::serde::Deserialize>::deserialize(deserializer)?;
                <Self as $crate::ClimateEnum>::coerce(&raw).map_err(::serde::de::Error::custom)
            }
        }
    };
}
