use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use super::node::{Codec, PartitionData, TaskError};

pub mod gather;
pub mod generate;
pub mod reduce;

/// Element codec shared by the operators that put partitions on the wire.
/// Encoding happens here, in the typed layer; the collectives only ever
/// see bytes.
pub(crate) fn codec<T>() -> Codec
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    Codec {
        enc: Arc::new(|part: &PartitionData| {
            let items = part.as_slice::<T>()?;
            bincode::serialize(items).map_err(|e| TaskError::Codec(e.to_string()))
        }),
        dec: Arc::new(|bytes: &[u8]| {
            let items: Vec<T> =
                bincode::deserialize(bytes).map_err(|e| TaskError::Codec(e.to_string()))?;
            Ok(PartitionData::from_vec(items))
        }),
        concat: Arc::new(|parts: Vec<PartitionData>| {
            let mut out: Vec<T> = Vec::new();
            for part in &parts {
                out.extend_from_slice(part.as_slice::<T>()?);
            }
            Ok(PartitionData::from_vec(out))
        }),
    }
}
