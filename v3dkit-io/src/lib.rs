//! Reading and writing V3D scene files
//!
//! A V3D file is a big-endian XDR stream: a `version`/`double precision`
//! preamble followed by tagged records until end of file. Decoding produces a
//! [`SceneFile`] holding the header, materials, geometry records and the
//! flattened vertex/index buffers ready for rendering.
//!
//! ```rust,no_run
//! use v3dkit_io::SceneFile;
//!
//! fn example() -> v3dkit_core::Result<()> {
//!     let scene = SceneFile::load("figure.v3d")?;
//!     println!("{} triangles", scene.triangle_count());
//!     for warning in &scene.warnings {
//!         println!("warning: {}", warning);
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod header;
pub mod records;
pub mod scene;
pub mod writer;
pub mod xdr;

pub use error::DecodeError;
pub use records::{decode_record, encode_record, Record};
pub use scene::{DecodeOptions, SceneFile, UnknownTagPolicy};
pub use writer::{SceneWriter, FORMAT_VERSION};
pub use xdr::{Precision, XdrReader, XdrWriter};
