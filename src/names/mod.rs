mod mapper;

pub use mapper::{
    NameMapper, array_element, generic_parts, mdarray_rank, primitive_descriptors, sanitize,
};
