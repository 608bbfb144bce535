//! In-memory Kumo account and units
//!
//! Behaves like a unit that accepts every request. Changes made through the
//! setters, or through [`MemoryUnit::report_mode`] to simulate someone using
//! the remote, become visible to readers after the next
//! [`KumoUnit::update_status`].

use crate::error::{KumoError, KumoResult};
use crate::unit::{ConnectOptions, KumoAccount, KumoUnit};
use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default)]
struct Status {
    mode: Option<String>,
    current_temperature: Option<f64>,
    heat_setpoint: Option<f64>,
    cool_setpoint: Option<f64>,
    current_humidity: Option<f64>,
    fan_speed: Option<String>,
    vane_direction: Option<String>,
}

/// Unit held entirely in memory
#[derive(Debug)]
pub struct MemoryUnit {
    name: String,
    serial: String,
    /// Values the unit currently holds
    device: Mutex<Status>,
    /// Values as of the last successful update
    cached: Mutex<Status>,
    fan_speeds: Vec<String>,
    vane_directions: Vec<String>,
    reachable: AtomicBool,
    requests: Mutex<Vec<String>>,
}

impl MemoryUnit {
    pub fn new(name: impl Into<String>, serial: impl Into<String>) -> Self {
        let status = Status {
            mode: Some("off".to_string()),
            current_temperature: Some(21.0),
            heat_setpoint: Some(20.0),
            cool_setpoint: Some(24.0),
            current_humidity: None,
            fan_speed: Some("auto".to_string()),
            vane_direction: Some("auto".to_string()),
        };
        Self {
            name: name.into(),
            serial: serial.into(),
            device: Mutex::new(status.clone()),
            cached: Mutex::new(status),
            fan_speeds: ["quiet", "low", "powerful", "auto"].map(String::from).to_vec(),
            vane_directions: ["auto", "horizontal", "midhorizontal", "swing"]
                .map(String::from)
                .to_vec(),
            reachable: AtomicBool::new(true),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn device(&self) -> std::sync::MutexGuard<'_, Status> {
        self.device.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn cached(&self) -> std::sync::MutexGuard<'_, Status> {
        self.cached.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Change the mode as if set on the unit itself
    pub fn report_mode(&self, mode: &str) {
        self.device().mode = Some(mode.to_string());
    }

    /// Change the room reading
    pub fn report_temperature(&self, celsius: f64) {
        self.device().current_temperature = Some(celsius);
    }

    pub fn report_humidity(&self, humidity: f64) {
        self.device().current_humidity = Some(humidity);
    }

    /// Make status updates and requests fail
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Requests received so far, e.g. `mode:heat`
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    fn request(&self, request: String) -> KumoResult<String> {
        if !self.reachable.load(Ordering::SeqCst) {
            return Err(KumoError::Unreachable {
                serial: self.serial.clone(),
                reason: "no response".to_string(),
            });
        }
        let ack = json!({ "serial": self.serial, "request": request }).to_string();
        self.requests
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(request);
        Ok(ack)
    }

    fn check_option(&self, options: &[String], value: &str) -> KumoResult<()> {
        if options.iter().any(|o| o == value) {
            Ok(())
        } else {
            Err(KumoError::Rejected {
                serial: self.serial.clone(),
                reason: format!("unknown option {}", value),
            })
        }
    }
}

#[async_trait]
impl KumoUnit for MemoryUnit {
    fn name(&self) -> &str {
        &self.name
    }

    fn serial(&self) -> &str {
        &self.serial
    }

    async fn update_status(&self) -> KumoResult<()> {
        if !self.reachable.load(Ordering::SeqCst) {
            return Err(KumoError::Unreachable {
                serial: self.serial.clone(),
                reason: "status request timed out".to_string(),
            });
        }
        let status = self.device().clone();
        *self.cached() = status;
        Ok(())
    }

    fn mode(&self) -> Option<String> {
        self.cached().mode.clone()
    }

    async fn set_mode(&self, mode: &str) -> KumoResult<String> {
        let ack = self.request(format!("mode:{}", mode))?;
        self.device().mode = Some(mode.to_string());
        Ok(ack)
    }

    fn current_temperature(&self) -> Option<f64> {
        self.cached().current_temperature
    }

    fn heat_setpoint(&self) -> Option<f64> {
        self.cached().heat_setpoint
    }

    fn cool_setpoint(&self) -> Option<f64> {
        self.cached().cool_setpoint
    }

    fn current_humidity(&self) -> Option<f64> {
        self.cached().current_humidity
    }

    fn fan_speed(&self) -> Option<String> {
        self.cached().fan_speed.clone()
    }

    fn fan_speeds(&self) -> Vec<String> {
        self.fan_speeds.clone()
    }

    fn vane_direction(&self) -> Option<String> {
        self.cached().vane_direction.clone()
    }

    fn vane_directions(&self) -> Vec<String> {
        self.vane_directions.clone()
    }

    async fn set_heat_setpoint(&self, setpoint: f64) -> KumoResult<String> {
        let ack = self.request(format!("heat_setpoint:{}", setpoint))?;
        self.device().heat_setpoint = Some(setpoint);
        Ok(ack)
    }

    async fn set_cool_setpoint(&self, setpoint: f64) -> KumoResult<String> {
        let ack = self.request(format!("cool_setpoint:{}", setpoint))?;
        self.device().cool_setpoint = Some(setpoint);
        Ok(ack)
    }

    async fn set_fan_speed(&self, speed: &str) -> KumoResult<String> {
        self.check_option(&self.fan_speeds, speed)?;
        let ack = self.request(format!("fan_speed:{}", speed))?;
        self.device().fan_speed = Some(speed.to_string());
        Ok(ack)
    }

    async fn set_vane_direction(&self, direction: &str) -> KumoResult<String> {
        self.check_option(&self.vane_directions, direction)?;
        let ack = self.request(format!("vane_direction:{}", direction))?;
        self.device().vane_direction = Some(direction.to_string());
        Ok(ack)
    }
}

/// Account holding a fixed set of [`MemoryUnit`]s
#[derive(Debug, Default)]
pub struct MemoryAccount {
    units: Vec<Arc<MemoryUnit>>,
    connections: Mutex<Vec<ConnectOptions>>,
}

impl MemoryAccount {
    pub fn new(units: Vec<Arc<MemoryUnit>>) -> Self {
        Self {
            units,
            connections: Mutex::new(Vec::new()),
        }
    }

    /// Options of every discovery so far
    pub fn connections(&self) -> Vec<ConnectOptions> {
        self.connections
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}

#[async_trait]
impl KumoAccount for MemoryAccount {
    type Unit = MemoryUnit;

    async fn indoor_units(&self, options: &ConnectOptions) -> KumoResult<Vec<Arc<MemoryUnit>>> {
        self.connections
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(*options);
        Ok(self.units.clone())
    }
}
