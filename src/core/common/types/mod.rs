pub mod data_type;
pub mod ids;
pub mod row;
pub mod schema;
pub mod value;

pub use data_type::DataType;
pub use ids::{PageId, SlotId, TableId, TransactionId};
pub use row::Tuple;
pub use schema::{ColumnDef, Schema};
pub use value::Value;
