use ndarray::{Array1, Array2};
use serde::{Serialize, Deserialize};

/// Gradient clipping applied to a full set of layer gradients before the
/// optimizer update.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GradientClipper {
    /// No clipping
    #[default]
    None,

    /// Clip every gradient element into `[min, max]`
    ClipByValue { min: f32, max: f32 },

    /// Rescale all gradients so their joint L2 norm is at most `max_norm`
    ClipByGlobalNorm { max_norm: f32 },
}

impl GradientClipper {
    /// Compute global norm of all gradients
    pub fn compute_global_norm(gradients: &[(Array2<f32>, Array1<f32>)]) -> f32 {
        gradients
            .iter()
            .map(|(w, b)| {
                w.iter().map(|&x| x * x).sum::<f32>() + b.iter().map(|&x| x * x).sum::<f32>()
            })
            .sum::<f32>()
            .sqrt()
    }

    /// Clip `(weight, bias)` gradient pairs in place.
    pub fn clip(&self, gradients: &mut [(Array2<f32>, Array1<f32>)]) {
        match self {
            GradientClipper::None => {}

            GradientClipper::ClipByValue { min, max } => {
                for (w, b) in gradients.iter_mut() {
                    w.mapv_inplace(|g| g.max(*min).min(*max));
                    b.mapv_inplace(|g| g.max(*min).min(*max));
                }
            }

            GradientClipper::ClipByGlobalNorm { max_norm } => {
                let global_norm = Self::compute_global_norm(gradients);
                if global_norm > *max_norm {
                    let scale = max_norm / global_norm;
                    for (w, b) in gradients.iter_mut() {
                        w.mapv_inplace(|g| g * scale);
                        b.mapv_inplace(|g| g * scale);
                    }
                }
            }
        }
    }
}
