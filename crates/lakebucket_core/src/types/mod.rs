pub mod datatype;
pub mod decimal;
pub mod scalar;
pub mod struct_value;
