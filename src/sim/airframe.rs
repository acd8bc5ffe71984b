use std::f64::consts::TAU;

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Single-axis airframe model
// ---------------------------------------------------------------------------

/// Linear roll or pitch response. Rate follows surface deflection with a
/// first-order lag; authority falls as the speed scaler rises.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Airframe {
    /// Steady-state rate per degree of surface at scaler 1, (deg/s)/deg.
    pub authority: f64,
    /// Rate response time constant, s.
    pub rate_tau: f64,
    /// Sinusoidal disturbance on angular acceleration, deg/s^2.
    pub gust_amplitude: f64,
    pub gust_hz: f64,
}

impl Default for Airframe {
    fn default() -> Self {
        Self { authority: 2.0, rate_tau: 0.15, gust_amplitude: 0.0, gust_hz: 0.7 }
    }
}

impl Airframe {
    /// Feed-forward gain that makes the open-loop rate match the demand.
    pub fn ideal_ff(&self) -> f64 {
        1.0 / self.authority
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisState {
    pub time: f64,
    /// [attitude deg, rate deg/s]
    pub x: Vector2<f64>,
}

impl AxisState {
    pub fn level() -> Self {
        Self { time: 0.0, x: Vector2::zeros() }
    }

    pub fn attitude(&self) -> f64 {
        self.x[0]
    }

    pub fn rate(&self) -> f64 {
        self.x[1]
    }
}

fn derivatives(airframe: &Airframe, time: f64, x: &Vector2<f64>, surface: f64, scaler: f64) -> Vector2<f64> {
    let steady_rate = airframe.authority * surface / scaler.max(1e-3);
    let gust = airframe.gust_amplitude * (TAU * airframe.gust_hz * time).sin();
    Vector2::new(x[1], (steady_rate - x[1]) / airframe.rate_tau + gust)
}

/// Single RK4 step with the surface held over the step.
pub fn rk4_step(airframe: &Airframe, state: &AxisState, surface: f64, scaler: f64, dt: f64) -> AxisState {
    let t = state.time;
    let k1 = derivatives(airframe, t, &state.x, surface, scaler);
    let k2 = derivatives(airframe, t + dt * 0.5, &(state.x + k1 * (dt * 0.5)), surface, scaler);
    let k3 = derivatives(airframe, t + dt * 0.5, &(state.x + k2 * (dt * 0.5)), surface, scaler);
    let k4 = derivatives(airframe, t + dt, &(state.x + k3 * dt), surface, scaler);

    AxisState {
        time: t + dt,
        x: state.x + (k1 + 2.0 * k2 + 2.0 * k3 + k4) * (dt / 6.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_settles_to_authority_times_surface() {
        let a = Airframe::default();
        let mut s = AxisState::level();
        for _ in 0..300 {
            s = rk4_step(&a, &s, 10.0, 1.0, 0.01);
        }
        assert!((s.rate() - 20.0).abs() < 1e-3, "rate {}", s.rate());
        assert!(s.attitude() > 0.0);
    }

    #[test]
    fn higher_scaler_means_less_authority() {
        let a = Airframe::default();
        let mut s = AxisState::level();
        for _ in 0..300 {
            s = rk4_step(&a, &s, 10.0, 2.0, 0.01);
        }
        assert!((s.rate() - 10.0).abs() < 1e-3);
    }

    #[test]
    fn first_order_lag_matches_closed_form() {
        let a = Airframe::default();
        let mut s = AxisState::level();
        for _ in 0..15 {
            s = rk4_step(&a, &s, 10.0, 1.0, 0.01);
        }
        // one time constant
        let expected = 20.0 * (1.0 - (-1.0_f64).exp());
        assert!((s.rate() - expected).abs() < 1e-4);
    }
}
