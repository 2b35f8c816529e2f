//! Parser for Java-source-like type expressions.
//!
//! ```text
//! type     := name ('<' arg (',' arg)* '>')? ('[' ']')*
//! arg      := wildcard | type
//! wildcard := '?' (('extends' | 'super') type)?
//! ```
//!
//! A wildcard is also accepted as a whole expression so callers can build free-standing
//! wildcard nodes.

use crate::error::{Result, TypesError};
use crate::{TypeExpr, TypeStore, TypeVarId, WildcardType};

impl TypeStore {
    /// Parse `text` with no type variables in scope.
    pub fn parse_type(&self, text: &str) -> Result<TypeExpr> {
        self.parse_type_in(text, &[])
    }

    /// Parse `text`, resolving simple names against `scope` first. Later entries shadow earlier
    /// ones, so a method's type parameters can be appended after its class's.
    pub fn parse_type_in(&self, text: &str, scope: &[TypeVarId]) -> Result<TypeExpr> {
        let mut parser = Parser {
            store: self,
            scope,
            input: text,
            pos: 0,
        };
        parser.skip_ws();
        let ty = if parser.peek() == Some('?') {
            parser.wildcard()?
        } else {
            parser.ty()?
        };
        parser.skip_ws();
        if parser.pos != text.len() {
            return Err(TypesError::TrailingInput {
                input: text.to_string(),
                offset: parser.pos,
            });
        }
        Ok(ty)
    }
}

struct Parser<'a> {
    store: &'a TypeStore,
    scope: &'a [TypeVarId],
    input: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn unexpected(&self) -> TypesError {
        match self.peek() {
            Some(found) => TypesError::UnexpectedChar {
                input: self.input.to_string(),
                offset: self.pos,
                found,
            },
            None => TypesError::UnexpectedEof(self.input.to_string()),
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        self.skip_ws();
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn ident(&mut self) -> Result<&str> {
        self.skip_ws();
        let start = self.pos;
        match self.peek() {
            Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
            _ => return Err(self.unexpected()),
        }
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$' || c == '.')
        {
            self.bump();
        }
        Ok(&self.input[start..self.pos])
    }

    fn keyword(&mut self, kw: &str) -> bool {
        let rest = &self.input[self.pos..];
        if !rest.starts_with(kw) {
            return false;
        }
        let boundary = rest[kw.len()..]
            .chars()
            .next()
            .map_or(true, |c| !(c.is_alphanumeric() || c == '_' || c == '$'));
        if boundary {
            self.pos += kw.len();
        }
        boundary
    }

    fn lookup_var(&self, name: &str) -> Option<TypeVarId> {
        if name.contains('.') {
            return None;
        }
        self.scope
            .iter()
            .rev()
            .copied()
            .find(|id| self.store.type_param(*id).is_some_and(|tp| tp.name == name))
    }

    fn ty(&mut self) -> Result<TypeExpr> {
        let name = self.ident()?.to_string();

        let mut ty = if let Some(var) = self.lookup_var(&name) {
            TypeExpr::Variable(var)
        } else {
            let class = self
                .store
                .lookup_class(&name)
                .ok_or_else(|| TypesError::UnknownType(name.clone()))?;

            self.skip_ws();
            if self.peek() == Some('<') {
                self.bump();
                let mut args = vec![self.arg()?];
                loop {
                    self.skip_ws();
                    match self.peek() {
                        Some(',') => {
                            self.bump();
                            args.push(self.arg()?);
                        }
                        Some('>') => {
                            self.bump();
                            break;
                        }
                        _ => return Err(self.unexpected()),
                    }
                }

                let expected = self.store.type_parameters(class).len();
                if expected != args.len() {
                    let class_name = self
                        .store
                        .class(class)
                        .map(|def| def.name.clone())
                        .unwrap_or(name);
                    return Err(TypesError::GenericArity {
                        class: class_name,
                        expected,
                        found: args.len(),
                    });
                }
                TypeExpr::parameterized(class, args)
            } else {
                TypeExpr::class(class)
            }
        };

        loop {
            self.skip_ws();
            if self.peek() != Some('[') {
                break;
            }
            self.bump();
            self.expect(']')?;
            if matches!(&ty, TypeExpr::Class(erasure) if erasure.checked_array().is_none()) {
                return Err(TypesError::TooManyDimensions(self.input.to_string()));
            }
            ty = TypeExpr::array_of(ty);
        }
        Ok(ty)
    }

    fn arg(&mut self) -> Result<TypeExpr> {
        self.skip_ws();
        if self.peek() == Some('?') {
            self.wildcard()
        } else {
            self.ty()
        }
    }

    fn wildcard(&mut self) -> Result<TypeExpr> {
        self.expect('?')?;
        self.skip_ws();
        let wildcard = if self.keyword("extends") {
            WildcardType {
                upper_bounds: vec![self.ty()?],
                lower_bounds: Vec::new(),
            }
        } else if self.keyword("super") {
            WildcardType {
                upper_bounds: Vec::new(),
                lower_bounds: vec![self.ty()?],
            }
        } else {
            WildcardType::default()
        };

        self.skip_ws();
        if self.peek() == Some('[') {
            return Err(TypesError::MisplacedWildcard(self.input.to_string()));
        }
        Ok(TypeExpr::Wildcard(wildcard))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Erasure;

    #[test]
    fn parses_nested_generics_and_wildcards() {
        let store = TypeStore::with_minimal_jdk();
        let wk = store.well_known().clone();

        let parsed = store
            .parse_type("java.util.Map<String, java.util.List<? extends Number>>")
            .unwrap();
        assert_eq!(
            parsed,
            TypeExpr::parameterized(
                wk.map,
                vec![
                    TypeExpr::class(wk.string),
                    TypeExpr::parameterized(
                        wk.list,
                        vec![TypeExpr::extends(TypeExpr::class(wk.number))]
                    ),
                ]
            )
        );
    }

    #[test]
    fn array_suffixes_fold_into_erasure_arrays() {
        let store = TypeStore::with_minimal_jdk();
        let int = store.well_known().prim_int;

        assert_eq!(
            store.parse_type("int[][]").unwrap(),
            TypeExpr::Class(Erasure::array_of(int, 2))
        );

        let list = store.well_known().list;
        let string = store.well_known().string;
        assert_eq!(
            store.parse_type("java.util.List<String>[]").unwrap(),
            TypeExpr::GenericArray(Box::new(TypeExpr::parameterized(
                list,
                vec![TypeExpr::class(string)]
            )))
        );
    }

    #[test]
    fn scope_variables_shadow_classes() {
        let mut store = TypeStore::with_minimal_jdk();
        let t = store.add_type_param("T", vec![]);

        assert_eq!(
            store.parse_type_in("T[]", &[t]).unwrap(),
            TypeExpr::GenericArray(Box::new(TypeExpr::Variable(t)))
        );
        assert!(matches!(
            store.parse_type("T"),
            Err(TypesError::UnknownType(name)) if name == "T"
        ));
    }

    #[test]
    fn rejects_malformed_input() {
        let store = TypeStore::with_minimal_jdk();

        assert!(matches!(
            store.parse_type("java.util.List<String"),
            Err(TypesError::UnexpectedEof(_))
        ));
        assert!(matches!(
            store.parse_type("java.util.Map<String>"),
            Err(TypesError::GenericArity {
                expected: 2,
                found: 1,
                ..
            })
        ));
        assert!(matches!(
            store.parse_type("String]"),
            Err(TypesError::TrailingInput { offset: 6, .. })
        ));
        assert!(matches!(
            store.parse_type("java.util.List<?[]>"),
            Err(TypesError::MisplacedWildcard(_))
        ));
    }

    #[test]
    fn multibyte_whitespace_and_symbols() {
        let store = TypeStore::with_minimal_jdk();
        let wk = store.well_known().clone();
        let list_of_strings = TypeExpr::parameterized(wk.list, vec![TypeExpr::class(wk.string)]);

        assert_eq!(
            store.parse_type("java.util.List<\u{00A0}String>").unwrap(),
            list_of_strings
        );
        assert_eq!(
            store.parse_type("\u{3000}java.util.List<String\u{2003}>\u{00A0}").unwrap(),
            list_of_strings
        );
        assert!(matches!(
            store.parse_type("java.util.List<\u{00A0}\u{00A7}>"),
            Err(TypesError::UnexpectedChar { found: '\u{00A7}', offset: 17, .. })
        ));
    }

    #[test]
    fn array_dimensions_are_bounded() {
        let store = TypeStore::with_minimal_jdk();
        let int = store.well_known().prim_int;

        let deepest = format!("int{}", "[]".repeat(255));
        assert_eq!(
            store.parse_type(&deepest).unwrap(),
            TypeExpr::Class(Erasure::array_of(int, Erasure::MAX_DIMS))
        );
        assert!(matches!(
            store.parse_type(&format!("{deepest}[]")),
            Err(TypesError::TooManyDimensions(_))
        ));
    }

    #[test]
    fn super_wildcard_at_top_level() {
        let store = TypeStore::with_minimal_jdk();
        let string = store.well_known().string;
        assert_eq!(
            store.parse_type("? super String").unwrap(),
            TypeExpr::super_of(TypeExpr::class(string))
        );
        assert_eq!(store.parse_type("?").unwrap(), TypeExpr::unbounded());
    }
}
