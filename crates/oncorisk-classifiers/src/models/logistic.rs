use crate::config::{ModelConfig, ModelType};
use crate::data_handling::Frame;
use crate::error::{ClassifierError, Result};
use crate::math::Array2;
use crate::models::classifier_trait::{single_class_prediction, ClassifierModel, Prediction};

/// Binomial logistic regression fitted by Newton-Raphson (IRLS).
pub struct LogisticClassifier {
    params: ModelConfig,
}

/// Intercept followed by one coefficient per attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticFit {
    pub coefficients: Vec<f64>,
    pub iterations: usize,
    pub deviance: f64,
}

impl LogisticFit {
    pub fn probability(&self, row: &[f64]) -> f64 {
        let eta = self.coefficients[0]
            + row
                .iter()
                .zip(&self.coefficients[1..])
                .map(|(x, b)| x * b)
                .sum::<f64>();
        sigmoid(eta)
    }
}

impl LogisticClassifier {
    pub fn new(params: ModelConfig) -> Self {
        LogisticClassifier { params }
    }

    /// Fit the coefficients on `x` against 0 / 1 targets `y`.
    pub fn fit(&self, x: &Array2<f64>, y: &[f64]) -> Result<LogisticFit> {
        let (max_iter, tolerance, l2_penalty) = match &self.params.model_type {
            ModelType::Logistic {
                max_iter,
                tolerance,
                l2_penalty,
            } => (*max_iter, *tolerance, *l2_penalty),
            other => {
                return Err(ClassifierError::InvalidParameter(format!(
                    "Expected ModelType::Logistic params, got {}",
                    other.name()
                )))
            }
        };

        let n = x.nrows();
        let dim = x.ncols() + 1;
        let mut beta = vec![0.0f64; dim];
        let mut deviance = n as f64 * 2.0 * std::f64::consts::LN_2;

        for iteration in 1..=max_iter {
            let mut gradient = vec![0.0f64; dim];
            let mut hessian = vec![0.0f64; dim * dim];

            for (i, row) in x.rows().enumerate() {
                let mu = clamp_probability(linear_predictor(&beta, row));
                let w = mu * (1.0 - mu);
                let resid = y[i] - mu;

                for a in 0..dim {
                    let xa = if a == 0 { 1.0 } else { row[a - 1] };
                    gradient[a] += xa * resid;
                    for b in 0..=a {
                        let xb = if b == 0 { 1.0 } else { row[b - 1] };
                        hessian[a * dim + b] += w * xa * xb;
                    }
                }
            }
            for a in 0..dim {
                gradient[a] -= l2_penalty * beta[a];
                hessian[a * dim + a] += l2_penalty;
                for b in 0..a {
                    hessian[b * dim + a] = hessian[a * dim + b];
                }
            }

            let step = cholesky_solve(&hessian, &gradient, dim).ok_or_else(|| self.fit_error(
                format!("Hessian is not positive definite at iteration {}", iteration),
            ))?;
            for (b, s) in beta.iter_mut().zip(&step) {
                *b += s;
            }
            if beta.iter().any(|b| !b.is_finite()) {
                return Err(self.fit_error(format!("non-finite coefficients at iteration {}", iteration)));
            }

            let new_deviance = binomial_deviance(&beta, x, y);
            log::trace!("Logistic iteration {}: deviance {:.6}", iteration, new_deviance);
            if (new_deviance - deviance).abs() / (new_deviance.abs() + 0.1) < tolerance {
                return Ok(LogisticFit {
                    coefficients: beta,
                    iterations: iteration,
                    deviance: new_deviance,
                });
            }
            deviance = new_deviance;
        }

        Err(self.fit_error(format!("did not converge in {} iterations", max_iter)))
    }

    fn fit_error(&self, reason: String) -> ClassifierError {
        ClassifierError::Fit {
            model: self.name().to_string(),
            reason,
        }
    }
}

impl ClassifierModel for LogisticClassifier {
    fn fit_predict(&self, train: &Frame, test: &Frame) -> Result<Prediction> {
        if let Some(prediction) = single_class_prediction(train, test) {
            return Ok(prediction);
        }
        let y: Vec<f64> = train.y.iter().map(|d| d.code()).collect();
        let fit = self.fit(&train.x, &y)?;
        log::debug!(
            "Logistic converged after {} iterations (deviance {:.4})",
            fit.iterations,
            fit.deviance
        );
        let scores = test.x.rows().map(|row| fit.probability(row)).collect();
        Ok(Prediction::from_scores(scores))
    }

    fn name(&self) -> &str {
        "Logistic"
    }
}

fn linear_predictor(beta: &[f64], row: &[f64]) -> f64 {
    beta[0] + row.iter().zip(&beta[1..]).map(|(x, b)| x * b).sum::<f64>()
}

fn sigmoid(eta: f64) -> f64 {
    1.0 / (1.0 + (-eta).exp())
}

fn clamp_probability(eta: f64) -> f64 {
    sigmoid(eta).clamp(1e-12, 1.0 - 1e-12)
}

fn binomial_deviance(beta: &[f64], x: &Array2<f64>, y: &[f64]) -> f64 {
    -2.0 * x
        .rows()
        .zip(y)
        .map(|(row, &yi)| {
            let mu = clamp_probability(linear_predictor(beta, row));
            yi * mu.ln() + (1.0 - yi) * (1.0 - mu).ln()
        })
        .sum::<f64>()
}

/// Solve `a * x = b` for a symmetric positive definite row-major `a`.
fn cholesky_solve(a: &[f64], b: &[f64], n: usize) -> Option<Vec<f64>> {
    let mut l = vec![0.0f64; n * n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i * n + j];
            for k in 0..j {
                sum -= l[i * n + k] * l[j * n + k];
            }
            if i == j {
                if sum <= 0.0 || !sum.is_finite() {
                    return None;
                }
                l[i * n + i] = sum.sqrt();
            } else {
                l[i * n + j] = sum / l[j * n + j];
            }
        }
    }

    // forward substitution: L z = b
    let mut z = vec![0.0f64; n];
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[i * n + k] * z[k];
        }
        z[i] = sum / l[i * n + i];
    }
    // back substitution: L^T x = z
    let mut x = vec![0.0f64; n];
    for i in (0..n).rev() {
        let mut sum = z[i];
        for k in i + 1..n {
            sum -= l[k * n + i] * x[k];
        }
        x[i] = sum / l[i * n + i];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cholesky_solves_small_system() {
        // [[4, 2], [2, 3]] x = [2, 1]  ->  x = [0.5, 0]
        let x = cholesky_solve(&[4.0, 2.0, 2.0, 3.0], &[2.0, 1.0], 2).unwrap();
        assert!((x[0] - 0.5).abs() < 1e-12);
        assert!(x[1].abs() < 1e-12);
        assert!(cholesky_solve(&[0.0, 0.0, 0.0, 0.0], &[1.0, 1.0], 2).is_none());
    }

    #[test]
    fn recovers_intercept_only_log_odds() {
        // one uninformative column, prevalence 1/4 -> intercept ln(1/3)
        let x = Array2::from_shape_vec((8, 1), vec![0.0; 8]).unwrap();
        let y = vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0];
        let model = LogisticClassifier::new(ModelConfig::new(1, ModelType::default_logistic()));
        let fit = model.fit(&x, &y).unwrap();
        assert!((fit.coefficients[0] - (1.0f64 / 3.0).ln()).abs() < 1e-4);
        assert!((fit.probability(&[0.0]) - 0.25).abs() < 1e-4);
    }

    #[test]
    fn rejects_foreign_params() {
        let x = Array2::from_shape_vec((2, 1), vec![0.0, 1.0]).unwrap();
        let model = LogisticClassifier::new(ModelConfig::new(1, ModelType::default_boosting()));
        assert!(matches!(
            model.fit(&x, &[0.0, 1.0]),
            Err(ClassifierError::InvalidParameter(_))
        ));
    }
}
