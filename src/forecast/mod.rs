pub mod forecaster;
pub mod regression;

pub use forecaster::{Forecast, ForecastMethod, TrajectoryForecaster, FORECAST_MODEL_ID};
pub use regression::{fit_linear, LinearFit};
