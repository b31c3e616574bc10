//! Declarative, storage-independent query language.

mod filter;
mod options;
mod value;

pub use filter::{Comparator, FieldFilter, Filter, Op, COMBINATOR_PREFIX};
pub use options::{
    CursorDirection, OrderBy, Page, Pagination, QueryOptions, SortDirection, Specification,
};
pub use value::Value;
