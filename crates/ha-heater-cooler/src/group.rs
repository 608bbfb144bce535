//! Group on/off membership

use crate::DOMAIN;
use ha_climate::{ClimateEnum, CurrentState};
use ha_core::STATE_OFF;

/// Which member states make a group of heater/coolers count as on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnOffStates {
    pub domain: &'static str,
    pub on_states: Vec<&'static str>,
    pub off_state: &'static str,
}

impl OnOffStates {
    pub fn is_on(&self, state: &str) -> bool {
        self.on_states.contains(&state)
    }

    /// A group is on when any member is on
    pub fn any_on<'a>(&self, states: impl IntoIterator<Item = &'a str>) -> bool {
        states.into_iter().any(|s| self.is_on(s))
    }
}

/// Every current state except `inactive` is on; off is `off`
pub fn on_off_states() -> OnOffStates {
    OnOffStates {
        domain: DOMAIN,
        on_states: CurrentState::on_states().iter().map(|s| s.as_str()).collect(),
        off_state: STATE_OFF,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_on_states_exclude_inactive() {
        let states = on_off_states();
        assert_eq!(states.on_states, vec!["idle", "heating", "cooling"]);
        assert_eq!(states.off_state, "off");
        assert!(!states.is_on("inactive"));
        assert!(states.is_on("heating"));
    }

    #[test]
    fn test_any_on() {
        let states = on_off_states();
        assert!(states.any_on(["inactive", "cooling"]));
        assert!(!states.any_on(["inactive", "unavailable"]));
    }
}
