pub mod collection;
pub mod drawing;
pub mod markup;
