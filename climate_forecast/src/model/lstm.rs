//! Recurrent network for next-step sequence prediction
//!
//! Single LSTM layer (tanh gates and candidate), inverted dropout on the
//! final hidden state during training, and a linear output head. Trained
//! with Adam on mean squared error, one example per step, backpropagating
//! through the full input window.

use log::debug;
use ndarray::{azip, s, Array, Array1, Array2, Axis, Dimension};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::SequenceModel;
use crate::config::ModelConfig;
use crate::error::{ClimateError, Result};
use crate::window::TrainingWindows;

const BETA1: f64 = 0.9;
const BETA2: f64 = 0.999;
const EPS: f64 = 1e-8;

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Per-step forward state kept for backpropagation through time.
struct StepCache {
    x: f64,
    h_prev: Array1<f64>,
    c_prev: Array1<f64>,
    i: Array1<f64>,
    f: Array1<f64>,
    g: Array1<f64>,
    o: Array1<f64>,
    tanh_c: Array1<f64>,
}

/// Adam moment estimates, one pair per parameter tensor.
struct AdamState {
    t: u64,
    m_wx: Array2<f64>,
    v_wx: Array2<f64>,
    m_wh: Array2<f64>,
    v_wh: Array2<f64>,
    m_b: Array1<f64>,
    v_b: Array1<f64>,
    m_wo: Array1<f64>,
    v_wo: Array1<f64>,
    m_bo: f64,
    v_bo: f64,
}

impl AdamState {
    fn new(hidden: usize) -> Self {
        let four_h = 4 * hidden;
        Self {
            t: 0,
            m_wx: Array2::zeros((four_h, 1)),
            v_wx: Array2::zeros((four_h, 1)),
            m_wh: Array2::zeros((four_h, hidden)),
            v_wh: Array2::zeros((four_h, hidden)),
            m_b: Array1::zeros(four_h),
            v_b: Array1::zeros(four_h),
            m_wo: Array1::zeros(hidden),
            v_wo: Array1::zeros(hidden),
            m_bo: 0.0,
            v_bo: 0.0,
        }
    }
}

fn adam_step<D: Dimension>(
    param: &mut Array<f64, D>,
    grad: &Array<f64, D>,
    m: &mut Array<f64, D>,
    v: &mut Array<f64, D>,
    lr: f64,
    t: f64,
) {
    let bc1 = 1.0 - BETA1.powf(t);
    let bc2 = 1.0 - BETA2.powf(t);
    azip!((p in param, &g in grad, m in m, v in v) {
        *m = BETA1 * *m + (1.0 - BETA1) * g;
        *v = BETA2 * *v + (1.0 - BETA2) * g * g;
        *p -= lr * (*m / bc1) / ((*v / bc2).sqrt() + EPS);
    });
}

fn adam_step_scalar(param: &mut f64, grad: f64, m: &mut f64, v: &mut f64, lr: f64, t: f64) {
    *m = BETA1 * *m + (1.0 - BETA1) * grad;
    *v = BETA2 * *v + (1.0 - BETA2) * grad * grad;
    let bc1 = 1.0 - BETA1.powf(t);
    let bc2 = 1.0 - BETA2.powf(t);
    *param -= lr * (*m / bc1) / ((*v / bc2).sqrt() + EPS);
}

/// Trained weights plus the fixed architecture of the forecast network.
///
/// Gate weights are stacked `[input, forget, candidate, output]` along the
/// first axis. A fresh network is constructed for every retrain cycle; all
/// randomness derives from the process-wide determinism seed.
#[derive(Debug, Clone)]
pub struct LstmNetwork {
    window_len: usize,
    hidden: usize,
    dropout: f64,
    learning_rate: f64,
    w_x: Array2<f64>,
    w_h: Array2<f64>,
    b: Array1<f64>,
    w_out: Array1<f64>,
    b_out: f64,
    rng: StdRng,
}

impl LstmNetwork {
    /// Create a freshly initialized network for the given architecture.
    pub fn new(config: &ModelConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(super::determinism_seed());
        let hidden = config.hidden;
        let four_h = 4 * hidden;

        // Uniform Glorot-style limits per weight matrix.
        let input_limit = (6.0 / (1.0 + four_h as f64)).sqrt();
        let recurrent_limit = (6.0 / (hidden + four_h) as f64).sqrt();
        let dense_limit = (6.0 / (hidden as f64 + 1.0)).sqrt();

        let input_dist = Uniform::new_inclusive(-input_limit, input_limit);
        let w_x = Array2::from_shape_fn((four_h, 1), |_| input_dist.sample(&mut rng));
        let recurrent_dist = Uniform::new_inclusive(-recurrent_limit, recurrent_limit);
        let w_h = Array2::from_shape_fn((four_h, hidden), |_| recurrent_dist.sample(&mut rng));

        // Forget gate bias starts open; the rest at zero.
        let mut b = Array1::zeros(four_h);
        b.slice_mut(s![hidden..2 * hidden]).fill(1.0);

        let dense_dist = Uniform::new_inclusive(-dense_limit, dense_limit);
        let w_out = Array1::from_shape_fn(hidden, |_| dense_dist.sample(&mut rng));

        Self {
            window_len: config.window_len,
            hidden,
            dropout: config.dropout,
            learning_rate: config.learning_rate,
            w_x,
            w_h,
            b,
            w_out,
            b_out: 0.0,
            rng,
        }
    }

    /// The input window length the network was built for.
    pub fn window_len(&self) -> usize {
        self.window_len
    }

    fn forward_steps(&self, window: &[f64], collect: bool) -> (Array1<f64>, Vec<StepCache>) {
        let hidden = self.hidden;
        let mut h = Array1::<f64>::zeros(hidden);
        let mut c = Array1::<f64>::zeros(hidden);
        let mut caches = Vec::with_capacity(if collect { window.len() } else { 0 });

        for &x in window {
            let z = self.w_x.column(0).mapv(|w| w * x) + self.w_h.dot(&h) + &self.b;
            let i = z.slice(s![0..hidden]).mapv(sigmoid);
            let f = z.slice(s![hidden..2 * hidden]).mapv(sigmoid);
            let g = z.slice(s![2 * hidden..3 * hidden]).mapv(f64::tanh);
            let o = z.slice(s![3 * hidden..4 * hidden]).mapv(sigmoid);

            let c_next = &f * &c + &i * &g;
            let tanh_c = c_next.mapv(f64::tanh);
            let h_next = &o * &tanh_c;

            if collect {
                caches.push(StepCache {
                    x,
                    h_prev: h,
                    c_prev: c,
                    i,
                    f,
                    g,
                    o,
                    tanh_c,
                });
            }
            h = h_next;
            c = c_next;
        }

        (h, caches)
    }

    /// One supervised example: forward with dropout, backpropagate through
    /// time, apply an Adam update. Returns the squared error.
    fn train_step(&mut self, window: &[f64], target: f64, adam: &mut AdamState) -> f64 {
        let (h, caches) = self.forward_steps(window, true);
        let hidden = self.hidden;
        let four_h = 4 * hidden;

        let mask = if self.dropout > 0.0 {
            let dropout = self.dropout;
            let scale = 1.0 / (1.0 - dropout);
            let rng = &mut self.rng;
            Array1::from_shape_fn(hidden, |_| {
                if rng.gen::<f64>() < dropout {
                    0.0
                } else {
                    scale
                }
            })
        } else {
            Array1::ones(hidden)
        };

        let h_drop = &h * &mask;
        let y = self.w_out.dot(&h_drop) + self.b_out;
        let err = y - target;
        let loss = err * err;

        // Output head gradients, then back through the dropout mask.
        let dy = 2.0 * err;
        let g_wout = h_drop.mapv(|v| v * dy);
        let g_bout = dy;
        let mut dh = self.w_out.mapv(|w| w * dy) * &mask;
        let mut dc = Array1::<f64>::zeros(hidden);

        let mut g_wx = Array2::<f64>::zeros((four_h, 1));
        let mut g_wh = Array2::<f64>::zeros((four_h, hidden));
        let mut g_b = Array1::<f64>::zeros(four_h);

        for cache in caches.iter().rev() {
            let d_o = &dh * &cache.tanh_c;
            let dtanh = cache.tanh_c.mapv(|t| 1.0 - t * t);
            dc = dc + &dh * &cache.o * &dtanh;

            let d_i = &dc * &cache.g;
            let d_g = &dc * &cache.i;
            let d_f = &dc * &cache.c_prev;

            let dz_i = d_i * &cache.i.mapv(|v| v * (1.0 - v));
            let dz_f = d_f * &cache.f.mapv(|v| v * (1.0 - v));
            let dz_g = d_g * &cache.g.mapv(|v| 1.0 - v * v);
            let dz_o = d_o * &cache.o.mapv(|v| v * (1.0 - v));

            let mut dz = Array1::<f64>::zeros(four_h);
            dz.slice_mut(s![0..hidden]).assign(&dz_i);
            dz.slice_mut(s![hidden..2 * hidden]).assign(&dz_f);
            dz.slice_mut(s![2 * hidden..3 * hidden]).assign(&dz_g);
            dz.slice_mut(s![3 * hidden..4 * hidden]).assign(&dz_o);

            g_wx.column_mut(0).scaled_add(cache.x, &dz);
            let dz_col = dz.view().insert_axis(Axis(1));
            let h_row = cache.h_prev.view().insert_axis(Axis(0));
            g_wh.scaled_add(1.0, &dz_col.dot(&h_row));
            g_b += &dz;

            dh = self.w_h.t().dot(&dz);
            dc = &dc * &cache.f;
        }

        adam.t += 1;
        let t = adam.t as f64;
        let lr = self.learning_rate;
        adam_step(&mut self.w_x, &g_wx, &mut adam.m_wx, &mut adam.v_wx, lr, t);
        adam_step(&mut self.w_h, &g_wh, &mut adam.m_wh, &mut adam.v_wh, lr, t);
        adam_step(&mut self.b, &g_b, &mut adam.m_b, &mut adam.v_b, lr, t);
        adam_step(&mut self.w_out, &g_wout, &mut adam.m_wo, &mut adam.v_wo, lr, t);
        adam_step_scalar(&mut self.b_out, g_bout, &mut adam.m_bo, &mut adam.v_bo, lr, t);

        loss
    }

    /// Epoch-bounded supervised training, minimizing mean squared error.
    ///
    /// Consumes the pairs in index order, one example per optimizer step,
    /// and returns the per-epoch mean loss curve. Fails if no pair is
    /// available or if the loss turns non-finite.
    pub fn train(&mut self, windows: &TrainingWindows<'_>, epochs: usize) -> Result<Vec<f64>> {
        if windows.window_len() != self.window_len {
            return Err(ClimateError::Training(format!(
                "window generator length {} does not match the model input length {}",
                windows.window_len(),
                self.window_len
            )));
        }
        let pair_count = windows.len();
        if pair_count == 0 {
            return Err(ClimateError::Training(
                "no training pairs; series is shorter than the input window".to_string(),
            ));
        }

        let mut adam = AdamState::new(self.hidden);
        let mut curve = Vec::with_capacity(epochs);
        for epoch in 0..epochs {
            let mut total = 0.0;
            for (window, target) in windows.iter() {
                total += self.train_step(window, target, &mut adam);
            }
            let mean_loss = total / pair_count as f64;
            if !mean_loss.is_finite() {
                return Err(ClimateError::Training(format!(
                    "non-finite loss at epoch {}",
                    epoch
                )));
            }
            if (epoch + 1) % 50 == 0 {
                debug!("epoch {}/{}: loss {:.6}", epoch + 1, epochs, mean_loss);
            }
            curve.push(mean_loss);
        }

        Ok(curve)
    }
}

impl SequenceModel for LstmNetwork {
    fn predict_one(&self, window: &[f64]) -> Result<f64> {
        if window.len() != self.window_len {
            return Err(ClimateError::Forecast(format!(
                "expected a window of {} values, got {}",
                self.window_len,
                window.len()
            )));
        }
        let (h, _) = self.forward_steps(window, false);
        Ok(self.w_out.dot(&h) + self.b_out)
    }
}
