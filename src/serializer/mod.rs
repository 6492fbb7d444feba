use crate::surface::Surface;
use crate::walker::{walk, Unit, UnitKind};

/// Canonical plain text of the surface: text runs verbatim, tokens as
/// `@DisplayName`, line breaks as `\n`, other elements by their contents.
pub fn serialize<S: Surface>(surface: &S) -> String {
    serialize_units(&walk(surface))
}

pub fn serialize_units<N>(units: &[Unit<N>]) -> String {
    let mut out = String::new();
    for u in units {
        match &u.kind {
            UnitKind::Text(s) => out.push_str(s),
            UnitKind::Token(t) => {
                out.push('@');
                out.push_str(&t.display_name);
            }
            UnitKind::Break | UnitKind::BlockStart => out.push('\n'),
        }
    }
    out
}
