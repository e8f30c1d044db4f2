//! Data module: typed arrays, their stores, and ragged dynamic lists
#![warn(missing_docs)]

pub mod any_array;
pub mod compare;
pub mod data_array;
pub mod data_type;
pub mod dispatch;
pub mod dynamic_list;
pub mod element;
pub mod store;

pub use any_array::AnyDataArray;
pub use compare::{ArrayComparison, ComparisonOptions, compare_arrays};
pub use data_array::DataArray;
pub use data_type::DataType;
pub use dispatch::{
    ArrayFunction, ArrayFunctionMut, DataFunction, execute_array_function,
    execute_array_function_mut, execute_data_function,
};
pub use dynamic_list::DynamicListArray;
pub use element::ArrayElement;
pub use store::{DataStore, EmptyDataStore, StoreFormat, VecDataStore};
