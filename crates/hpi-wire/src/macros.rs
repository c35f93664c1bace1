// Builds a `StructDescriptor` out of `"Name": descriptor` pairs.
macro_rules! fields {
    ($($name:literal : $descriptor:expr),* $(,)?) => {
        $crate::descriptor::StructDescriptor::from_fields(vec![
            $($crate::descriptor::Field::new($name, $descriptor)),*
        ])
    };
}

// Builds a `UnionDescriptor` out of `tag => descriptor` pairs.
macro_rules! union {
    ($discriminant:literal { $($tag:expr => $descriptor:expr),* $(,)? }) => {
        $crate::descriptor::UnionDescriptor::new($discriminant)
            $(.variant(u64::from($tag), $descriptor))*
    };
}
