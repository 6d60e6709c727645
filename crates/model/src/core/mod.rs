pub mod identifier;
pub mod table;
pub mod validation;
pub mod value;
pub mod value_type;
pub mod wire_type;
