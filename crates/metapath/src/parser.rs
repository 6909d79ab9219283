//! Metapath text parser.
//!
//! The grammar lives in `metapath.pest`; parsing yields the pest pair tree,
//! which is the concrete syntax tree consumed by the CST→AST builder in
//! [`crate::compiler`]. Malformed input fails here with a syntax error and
//! no AST is produced.

use pest::Parser;
use pest::iterators::Pairs;

pub mod ast;

use crate::runtime::{Error, ErrorKind};

#[derive(pest_derive::Parser)]
#[grammar = "metapath.pest"]
pub struct MetapathParser;

/// Parse the expression text into its concrete syntax tree.
pub fn parse_metapath(input: &str) -> Result<Pairs<'_, Rule>, Error> {
    MetapathParser::parse(Rule::metapath, input).map_err(|e| {
        Error::new(
            ErrorKind::Syntax,
            format!("failed to parse metapath expression: {e}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(input: &str) {
        parse_metapath(input).unwrap_or_else(|e| panic!("'{input}' should parse: {e}"));
    }

    #[test]
    fn accepts_core_expression_forms() {
        ok("1");
        ok("1.5");
        ok("'text'");
        ok("\"dou\"\"ble\"");
        ok("()");
        ok("(1, 2, 3)");
        ok("$var");
        ok("fn:boolean(.)");
        ok("concat('a', 'b', 'c')");
        ok("1 + 2 * 3 - 4 div 5");
        ok("7 idiv 2 mod 3");
        ok("'a' || 'b'");
        ok("1 = 2 or 3 != 4 and 5 lt 6");
        ok("@flag");
        ok("./root/field1");
        ok("/root//leaf");
        ok("../sibling");
        ok("parent::root");
        ok("ancestor-or-self::node()");
        ok("child::*[2]");
        ok("field[@flag = 'x'][1]");
        ok("-1");
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(parse_metapath("1 +").unwrap_err().kind, ErrorKind::Syntax);
        assert_eq!(parse_metapath("@").unwrap_err().kind, ErrorKind::Syntax);
        assert_eq!(parse_metapath("").unwrap_err().kind, ErrorKind::Syntax);
        assert_eq!(
            parse_metapath("field[").unwrap_err().kind,
            ErrorKind::Syntax
        );
    }
}
