pub mod gtf;
pub mod ortholog;
pub use gtf::{AttributeMode, Attributes, GStruct};
pub use ortholog::{OrthologRow, Species, SpeciesOrtholog};
