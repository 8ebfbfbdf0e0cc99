#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DataType {
    Integer,
    Float,
    Text,
    Boolean,
    Blob,
    Null,
}
