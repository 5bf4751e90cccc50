use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Parameters (one group per regulated axis set: xy, z, yaw)
// ---------------------------------------------------------------------------

/// Which limit the output clamp actually enforces.
///
/// `Integral` reproduces the legacy coupling where the clamp is switched on
/// by `limit_output` but compares against and assigns `limit_i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClampBound {
    #[default]
    Output,
    Integral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PidParams {
    pub enabled: bool,
    pub k_p: f64,
    pub k_i: f64,
    pub k_d: f64,
    /// Integral clamp magnitude. Non-positive or NaN = unbounded.
    #[serde(deserialize_with = "limit_or_unbounded")]
    pub limit_i: f64,
    /// Output clamp magnitude. Non-positive or NaN = unbounded.
    #[serde(deserialize_with = "limit_or_unbounded")]
    pub limit_output: f64,
    pub clamp_bound: ClampBound,
}

impl Default for PidParams {
    fn default() -> Self {
        Self {
            enabled: true,
            k_p: 0.0,
            k_i: 0.0,
            k_d: 0.0,
            limit_i: f64::NAN,
            limit_output: f64::NAN,
            clamp_bound: ClampBound::Output,
        }
    }
}

impl PidParams {
    pub fn new(k_p: f64, k_i: f64, k_d: f64) -> Self {
        Self { k_p, k_i, k_d, ..Self::default() }
    }

    pub fn disabled() -> Self {
        Self { enabled: false, ..Self::default() }
    }

    pub fn with_limit_i(mut self, limit: f64) -> Self {
        self.limit_i = limit;
        self
    }

    pub fn with_limit_output(mut self, limit: f64) -> Self {
        self.limit_output = limit;
        self
    }

    pub fn with_clamp_bound(mut self, bound: ClampBound) -> Self {
        self.clamp_bound = bound;
        self
    }

    /// Integral clamp magnitude, if clamping is enabled.
    pub fn integral_clamp(&self) -> Option<f64> {
        // `> 0.0` is false for NaN
        (self.limit_i > 0.0).then_some(self.limit_i)
    }

    /// Output clamp magnitude, if clamping is enabled.
    ///
    /// With [`ClampBound::Integral`] the bound is `limit_i` even though the
    /// switch is `limit_output`. A NaN `limit_i` never compares true, so it
    /// reports as no clamp. Any other `limit_i` is used as-is.
    pub fn output_clamp(&self) -> Option<f64> {
        let bound = match self.clamp_bound {
            ClampBound::Output => self.limit_output,
            ClampBound::Integral => self.limit_i,
        };
        (self.limit_output > 0.0 && !bound.is_nan()).then_some(bound)
    }
}

/// JSON has no NaN; `null` or a missing field means unbounded.
fn limit_or_unbounded<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

// ---------------------------------------------------------------------------
// Per-axis state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct AxisState {
    /// Last proportional error.
    pub p: f64,
    /// Accumulated integral.
    pub i: f64,
    /// Last derivative term.
    pub d: f64,
    /// Last measured rate.
    pub derivative: f64,
}

impl AxisState {
    pub fn new() -> Self {
        Self { p: f64::NAN, i: 0.0, d: f64::NAN, derivative: f64::NAN }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// True when no sample has been taken since the last reset.
    pub fn is_fresh(&self) -> bool {
        self.p.is_nan() && self.derivative.is_nan() && self.i == 0.0
    }
}

impl Default for AxisState {
    fn default() -> Self {
        Self::new()
    }
}

/// Which output bound was hit in the last clamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Saturation {
    None,
    Upper,
    Lower,
}

impl Saturation {
    pub fn sign(self) -> f64 {
        match self {
            Saturation::None => 0.0,
            Saturation::Upper => 1.0,
            Saturation::Lower => -1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Single-axis update
// ---------------------------------------------------------------------------

/// One PID step for a single axis.
///
/// `measured_rate` is an independent rate measurement along the axis, not
/// the numeric derivative of `error`. The derivative term blends the
/// backward difference of the error with the change in measured rate since
/// the previous step. Never fails: a NaN output is returned as 0.0.
pub fn update_pid(
    error: f64,
    measured_rate: f64,
    state: &mut AxisState,
    params: &PidParams,
    dt: f64,
) -> f64 {
    if !params.enabled {
        return 0.0;
    }

    let step = error * dt;
    state.i += step;
    if let Some(limit) = params.integral_clamp() {
        state.i = state.i.clamp(-limit, limit);
    }

    state.d = if dt > 0.0 && !state.p.is_nan() && !state.derivative.is_nan() {
        (error - state.p) / dt + state.derivative - measured_rate
    } else {
        -measured_rate
    };
    state.derivative = measured_rate;
    state.p = error;

    let mut output = params.k_p * state.p + params.k_i * state.i + params.k_d * state.d;

    let mut saturation = Saturation::None;
    if let Some(limit) = params.output_clamp() {
        if output > limit {
            output = limit;
            saturation = Saturation::Upper;
        }
        if output < -limit {
            output = -limit;
            saturation = Saturation::Lower;
        }
    }

    // Anti-windup: drop this step's integration while pushing into the bound
    if saturation != Saturation::None && step * saturation.sign() > 0.0 {
        state.i -= step;
    }

    if output.is_nan() {
        0.0
    } else {
        output
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn same_state(a: &AxisState, b: &AxisState) -> bool {
        let eq = |x: f64, y: f64| (x.is_nan() && y.is_nan()) || x == y;
        eq(a.p, b.p) && eq(a.i, b.i) && eq(a.d, b.d) && eq(a.derivative, b.derivative)
    }

    #[test]
    fn disabled_axis_outputs_zero_and_keeps_state() {
        let params = PidParams { k_p: 3.0, k_i: 1.0, k_d: 2.0, ..PidParams::disabled() };
        let mut state = AxisState::new();
        state.i = 0.25;
        state.p = 1.0;
        let before = state;
        for &(e, r, dt) in &[(1.0, 0.5, 0.1), (-4.0, f64::NAN, 0.0), (1e6, -3.0, 2.0)] {
            let out = update_pid(e, r, &mut state, &params, dt);
            assert_eq!(out, 0.0);
            assert!(same_state(&state, &before), "disabled axis must not touch state");
        }
    }

    #[test]
    fn proportional_only() {
        let params = PidParams::new(1.0, 0.0, 0.0);
        let mut state = AxisState::new();
        let out = update_pid(2.0, 0.0, &mut state, &params, 0.1);
        assert!((out - 2.0).abs() < 1e-12, "Pure P should output k_p * error, got {}", out);
    }

    #[test]
    fn integral_clamps_and_holds() {
        let params = PidParams::new(0.0, 1.0, 0.0).with_limit_i(0.5);
        let mut state = AxisState::new();
        for _ in 0..3 {
            let out = update_pid(10.0, 0.0, &mut state, &params, 1.0);
            assert!((state.i - 0.5).abs() < 1e-12);
            assert!((out - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn integral_stays_within_limit_for_mixed_errors() {
        let params = PidParams::new(0.3, 2.0, 0.1).with_limit_i(0.8);
        let mut state = AxisState::new();
        let errors = [5.0, 5.0, -0.2, -12.0, -12.0, 3.0, 0.0, 7.5, -7.5, 100.0];
        for (k, e) in errors.iter().enumerate() {
            update_pid(*e, 0.1 * k as f64, &mut state, &params, 0.25);
            assert!(state.i.abs() <= 0.8, "integral {} escaped the clamp", state.i);
        }
    }

    #[test]
    fn hybrid_derivative_uses_rate_delta() {
        let params = PidParams::new(0.0, 0.0, 1.0);
        let mut state = AxisState::new();
        let first = update_pid(1.0, 0.0, &mut state, &params, 1.0);
        assert_eq!(first, 0.0);
        let second = update_pid(1.0, 1.0, &mut state, &params, 1.0);
        assert!((state.d + 1.0).abs() < 1e-12);
        assert!((second + 1.0).abs() < 1e-12);
    }

    #[test]
    fn first_sample_uses_negated_rate() {
        let params = PidParams::new(0.0, 0.0, 1.0);
        let mut state = AxisState::new();
        update_pid(3.0, 0.7, &mut state, &params, 0.1);
        assert!((state.d + 0.7).abs() < 1e-12);
        assert_eq!(state.p, 3.0);
        assert_eq!(state.derivative, 0.7);
    }

    #[test]
    fn zero_dt_falls_back_to_negated_rate() {
        let params = PidParams::new(0.0, 0.0, 1.0);
        let mut state = AxisState::new();
        update_pid(1.0, 0.0, &mut state, &params, 0.1);
        update_pid(5.0, 2.0, &mut state, &params, 0.0);
        assert!((state.d + 2.0).abs() < 1e-12);
    }

    #[test]
    fn nan_rate_is_sanitized() {
        let params = PidParams::new(1.0, 0.0, 1.0);
        let mut state = AxisState::new();
        let out = update_pid(1.0, f64::NAN, &mut state, &params, 0.1);
        assert_eq!(out, 0.0);
        assert!(state.d.is_nan(), "NaN is allowed to propagate into state");
    }

    #[test]
    fn output_clamp_uses_limit_output() {
        let params = PidParams::new(10.0, 0.0, 0.0).with_limit_i(0.5).with_limit_output(2.0);
        let mut state = AxisState::new();
        assert_eq!(update_pid(1.0, 0.0, &mut state, &params, 0.1), 2.0);
        assert_eq!(update_pid(-1.0, 0.0, &mut state, &params, 0.1), -2.0);
    }

    #[test]
    fn legacy_clamp_enforces_limit_i() {
        let params = PidParams::new(10.0, 0.0, 0.0)
            .with_limit_i(0.5)
            .with_limit_output(2.0)
            .with_clamp_bound(ClampBound::Integral);
        let mut state = AxisState::new();
        assert_eq!(update_pid(1.0, 0.0, &mut state, &params, 0.1), 0.5);
    }

    #[test]
    fn legacy_clamp_with_unbounded_integral_never_clamps() {
        let params = PidParams::new(10.0, 0.0, 0.0)
            .with_limit_output(2.0)
            .with_clamp_bound(ClampBound::Integral);
        let mut state = AxisState::new();
        assert_eq!(update_pid(1.0, 0.0, &mut state, &params, 0.1), 10.0);
    }

    #[test]
    fn legacy_clamp_rolls_back_integral_at_limit_i() {
        let params = PidParams::new(1.0, 1.0, 0.0)
            .with_limit_i(0.5)
            .with_limit_output(2.0)
            .with_clamp_bound(ClampBound::Integral);
        let mut state = AxisState::new();
        state.i = 0.2;

        // 1.0 + 0.3 is inside limit_output but past limit_i
        let out = update_pid(1.0, 0.0, &mut state, &params, 0.1);
        assert_eq!(out, 0.5);
        assert!((state.i - 0.2).abs() < 1e-12, "integral {} not rolled back", state.i);

        state.i = -0.2;
        let out = update_pid(-1.0, 0.0, &mut state, &params, 0.1);
        assert_eq!(out, -0.5);
        assert!((state.i + 0.2).abs() < 1e-12, "integral {} not rolled back", state.i);
    }

    #[test]
    fn legacy_clamp_without_integral_limit_keeps_integrating() {
        let params = PidParams::new(1.0, 1.0, 0.0)
            .with_limit_output(0.5)
            .with_clamp_bound(ClampBound::Integral);
        assert!(params.output_clamp().is_none());
        let mut state = AxisState::new();
        let out = update_pid(10.0, 0.0, &mut state, &params, 0.1);
        assert!((out - 11.0).abs() < 1e-12);
        assert!((state.i - 1.0).abs() < 1e-12);
    }

    #[test]
    fn anti_windup_undoes_integration_while_saturated() {
        let params = PidParams::new(1.0, 1.0, 0.0).with_limit_output(1.0);
        let mut state = AxisState::new();
        let out = update_pid(5.0, 0.0, &mut state, &params, 0.1);
        assert_eq!(out, 1.0);
        assert_eq!(state.i, 0.0, "integral must not wind up into the upper bound");

        // Same against the lower bound
        state.i = 0.0;
        let out = update_pid(-5.0, 0.0, &mut state, &params, 0.1);
        assert_eq!(out, -1.0);
        assert_eq!(state.i, 0.0);
    }

    #[test]
    fn anti_windup_keeps_integration_that_unwinds() {
        let params = PidParams::new(0.0, 1.0, 1.0).with_limit_output(1.0);
        let mut state = AxisState::new();
        // Large measured rate drives the output into the lower bound while
        // the error is positive: the integral keeps accumulating.
        let out = update_pid(1.0, 10.0, &mut state, &params, 0.5);
        assert_eq!(out, -1.0);
        assert!((state.i - 0.5).abs() < 1e-12);
    }

    #[test]
    fn reset_restores_initial_form() {
        let params = PidParams::new(1.0, 1.0, 1.0);
        let mut state = AxisState::new();
        update_pid(1.0, 1.0, &mut state, &params, 0.1);
        assert!(!state.is_fresh());
        state.reset();
        assert!(state.is_fresh());
        assert!(state.d.is_nan());
    }

    #[test]
    fn params_deserialize_with_defaults() {
        let p: PidParams = serde_json::from_str(r#"{ "k_p": 2.0, "limit_i": null }"#).unwrap();
        assert!(p.enabled);
        assert_eq!(p.k_p, 2.0);
        assert_eq!(p.k_d, 0.0);
        assert!(p.integral_clamp().is_none());
        assert!(p.output_clamp().is_none());
        assert_eq!(p.clamp_bound, ClampBound::Output);

        let p: PidParams =
            serde_json::from_str(r#"{ "limit_output": 3.0, "clamp_bound": "integral" }"#).unwrap();
        assert_eq!(p.clamp_bound, ClampBound::Integral);
        assert!(p.output_clamp().is_none());
    }

    #[test]
    fn non_positive_limits_are_unbounded() {
        let p = PidParams::new(1.0, 1.0, 1.0).with_limit_i(0.0).with_limit_output(-1.0);
        assert!(p.integral_clamp().is_none());
        assert!(p.output_clamp().is_none());
    }
}
