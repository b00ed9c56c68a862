pub mod health;
pub mod inference;
pub mod tensor;

pub use health::READY_PATH;
pub use inference::{InferRequest, InferResponse, OutputTensor, PredictionRequest, round_sales};
pub use tensor::{Datatype, InputTensor, TensorValue};

/// Model served by the sales endpoint.
pub const MODEL_NAME: &str = "video-game-sales-model";

/// Path of the model's infer route, relative to the server base URL.
pub fn infer_path() -> String {
    format!("/v2/models/{}/infer", MODEL_NAME)
}
