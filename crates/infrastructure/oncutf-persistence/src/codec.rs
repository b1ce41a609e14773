use crate::StorageError;
use oncutf_core::{HashRecord, MetadataRecord, PathRecord, RenameEntry};

pub fn encode_path(record: &PathRecord) -> Result<Vec<u8>, StorageError> {
    Ok(serde_json::to_vec(record)?)
}

pub fn decode_path(bytes: &[u8]) -> Result<PathRecord, StorageError> {
    Ok(serde_json::from_slice(bytes)?)
}

pub fn encode_metadata(record: &MetadataRecord) -> Result<Vec<u8>, StorageError> {
    Ok(serde_json::to_vec(record)?)
}

pub fn decode_metadata(bytes: &[u8]) -> Result<MetadataRecord, StorageError> {
    Ok(serde_json::from_slice(bytes)?)
}

pub fn encode_hash(record: &HashRecord) -> Result<Vec<u8>, StorageError> {
    Ok(serde_json::to_vec(record)?)
}

pub fn decode_hash(bytes: &[u8]) -> Result<HashRecord, StorageError> {
    Ok(serde_json::from_slice(bytes)?)
}

pub fn encode_rename_entry(entry: &RenameEntry) -> Result<Vec<u8>, StorageError> {
    Ok(serde_json::to_vec(entry)?)
}

pub fn decode_rename_entry(bytes: &[u8]) -> Result<RenameEntry, StorageError> {
    Ok(serde_json::from_slice(bytes)?)
}
