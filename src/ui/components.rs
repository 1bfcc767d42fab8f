mod table;
mod text_input;

pub use table::{ColumnDef, Table, TableEvent, TableRow};
pub use text_input::TextInput;
