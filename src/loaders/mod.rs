pub mod fetch;
pub mod gltf;

pub use self::fetch::{fetch_model, AssetEvent, AssetKind, AssetLoader, AssetLocation, AssetOutcome, AssetSource, DefaultSource};
pub use self::gltf::{load_model_file, load_model_slice, Model, ModelNode};
