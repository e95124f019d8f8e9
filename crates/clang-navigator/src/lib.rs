pub mod config;
pub mod cursor;
pub mod declaration;
pub mod document;
pub mod flags;
pub mod paths;
pub mod server;
pub mod text_pos;
pub mod translation_unit;

pub use config::Settings;
pub use cursor::{Cursor, CursorLocation, SourceExtent, SourcePosition};
pub use declaration::{DeclarationLocation, get_declaration_location_and_spelling};
pub use flags::{CompileFlags, FlagsProvider};
pub use server::ClangNavigatorServer;
pub use translation_unit::{ParseRequest, TranslationUnit, UnitOrigin};
