use cobolt_core::function;
use tracing::warn;

use crate::{
    Condition, CopybookError, CopybookErrorKind, CopybookResult, Field, FieldFlags, Picture, Schema, Usage, FILLER,
};

/// Parses copybook text into a [`Schema`].
///
/// Comments are stripped (fixed-form indicator column and inline `*>`),
/// whitespace runs collapse to single spaces, and the text is split into
/// period-terminated statements. Each statement yields at most one field;
/// tree assembly is driven by level numbers.
pub fn parse(text: &str) -> CopybookResult<Schema> {
    let cleaned = strip_comments(text);

    let mut schema = Schema::new();
    // Stack of (level, id); the synthetic root sits at the bottom.
    let mut stack: Vec<(u8, usize)> = vec![(0, schema.root())];

    for statement in cleaned.split('.') {
        let statement = statement.trim();
        if statement.is_empty() {
            continue;
        }

        let Some(parsed) = parse_statement(statement)? else {
            continue;
        };

        match parsed {
            Statement::Condition { name, literal } => {
                let &(parent_level, parent_id) = stack.last().expect("stack holds at least the root");
                if parent_level == 0 {
                    return Err(CopybookError::new(
                        function!(),
                        CopybookErrorKind::ConditionWithoutParent { name },
                    ));
                }
                schema.field_mut(parent_id).conditions.push(Condition { name, literal });
            }
            Statement::Entry(field) => {
                let level = field.level;
                while stack.last().is_some_and(|&(l, _)| l >= level) {
                    stack.pop();
                }
                let &(_, parent_id) = stack.last().expect("root level 0 is never popped");
                let id = schema.push(field);
                schema.field_mut(parent_id).children.push(id);
                stack.push((level, id));
            }
        }
    }

    Ok(schema)
}

enum Statement {
    Entry(Field),
    Condition { name: String, literal: String },
}

fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());

    for line in text.lines() {
        // Inline comment to end of line.
        let line = line.split("*>").next().unwrap_or(line);

        // Fixed-form comment indicator in column 7.
        if matches!(line.as_bytes().get(6), Some(b'*' | b'/')) {
            continue;
        }
        // Free-form comment line.
        if line.trim_start().starts_with('*') {
            continue;
        }

        out.push_str(line);
        out.push(' ');
    }

    out
}

fn parse_statement(statement: &str) -> CopybookResult<Option<Statement>> {
    let tokens: Vec<&str> = statement.split_whitespace().collect();

    let first = tokens[0];
    if !first.bytes().all(|b| b.is_ascii_digit()) {
        // Not a data description entry (e.g. a stray directive); skip it.
        return Ok(None);
    }

    let level = parse_level(first, statement)?;

    if level == 88 {
        return parse_condition(&tokens, statement).map(Some);
    }

    let mut idx = 1;

    let name = match tokens.get(idx) {
        None => {
            return Err(statement_err(statement, "data item has no name and no clauses"));
        }
        Some(&token) if is_clause_keyword(token) => FILLER.to_owned(),
        Some(&token) => {
            idx += 1;
            token.to_ascii_uppercase()
        }
    };

    let mut field = Field::new(level, name);

    while idx < tokens.len() {
        let token = tokens[idx].to_ascii_uppercase();
        idx += 1;

        match token.as_str() {
            "PIC" | "PICTURE" => {
                skip_noise(&tokens, &mut idx);
                let Some(&pic) = tokens.get(idx) else {
                    return Err(statement_err(statement, "PICTURE clause has no picture"));
                };
                idx += 1;
                field.picture = Some(Picture::parse(pic)?);
            }
            "USAGE" => {
                skip_noise(&tokens, &mut idx);
                let Some(&kind) = tokens.get(idx) else {
                    return Err(statement_err(statement, "USAGE clause has no usage keyword"));
                };
                idx += 1;
                field.usage = Some(parse_usage(kind)?);
            }
            "OCCURS" => {
                let Some(count) = tokens.get(idx).and_then(|t| t.parse::<u32>().ok()) else {
                    return Err(statement_err(statement, "OCCURS clause has no repeat count"));
                };
                idx += 1;
                if count == 0 {
                    return Err(statement_err(statement, "OCCURS count must be positive"));
                }
                field.occurs = Some(count);
                consume_keyword(&tokens, &mut idx, "TIMES");
            }
            "REDEFINES" => {
                let Some(&target) = tokens.get(idx) else {
                    return Err(statement_err(statement, "REDEFINES clause has no target"));
                };
                idx += 1;
                field.redefines = Some(target.to_ascii_uppercase());
            }
            "VALUE" | "VALUES" => {
                skip_noise(&tokens, &mut idx);
                field.value = Some(take_literal(&tokens, &mut idx, statement)?);
            }
            "JUSTIFIED" | "JUST" => {
                field.flags |= FieldFlags::JUSTIFIED_RIGHT;
                consume_keyword(&tokens, &mut idx, "RIGHT");
            }
            "BLANK" => {
                consume_keyword(&tokens, &mut idx, "WHEN");
                if !consume_keyword(&tokens, &mut idx, "ZERO")
                    && !consume_keyword(&tokens, &mut idx, "ZEROS")
                    && !consume_keyword(&tokens, &mut idx, "ZEROES")
                {
                    return Err(statement_err(statement, "BLANK clause without ZERO"));
                }
                field.flags |= FieldFlags::BLANK_WHEN_ZERO;
            }
            "SIGN" => {
                skip_noise(&tokens, &mut idx);
                match tokens.get(idx).map(|t| t.to_ascii_uppercase()) {
                    Some(ref t) if t == "LEADING" => {
                        field.flags |= FieldFlags::SIGN_LEADING;
                        idx += 1;
                    }
                    Some(ref t) if t == "TRAILING" => {
                        idx += 1;
                    }
                    _ => {
                        return Err(statement_err(statement, "SIGN clause without LEADING or TRAILING"));
                    }
                }
                if consume_keyword(&tokens, &mut idx, "SEPARATE") {
                    field.flags |= FieldFlags::SIGN_SEPARATE;
                    consume_keyword(&tokens, &mut idx, "CHARACTER");
                }
            }
            "SYNCHRONIZED" | "SYNC" => {
                field.flags |= FieldFlags::SYNCHRONIZED;
                // Alignment side is irrelevant; no padding is applied.
                if !consume_keyword(&tokens, &mut idx, "LEFT") {
                    consume_keyword(&tokens, &mut idx, "RIGHT");
                }
            }
            other => {
                // Bare usage keyword without the USAGE prefix.
                if let Some(usage) = Usage::parse(other) {
                    field.usage = Some(usage);
                } else {
                    warn!(statement, token = other, "ignoring unrecognized clause token");
                }
            }
        }
    }

    Ok(Some(Statement::Entry(field)))
}

fn parse_condition(tokens: &[&str], statement: &str) -> CopybookResult<Statement> {
    let Some(&name) = tokens.get(1) else {
        return Err(statement_err(statement, "condition has no name"));
    };

    let mut idx = 2;
    match tokens.get(idx).map(|t| t.to_ascii_uppercase()) {
        Some(ref t) if t == "VALUE" || t == "VALUES" => idx += 1,
        _ => {
            return Err(statement_err(statement, "condition has no VALUE clause"));
        }
    }
    skip_noise(tokens, &mut idx);
    let literal = take_literal(tokens, &mut idx, statement)?;

    Ok(Statement::Condition {
        name: name.to_ascii_uppercase(),
        literal,
    })
}

fn parse_level(token: &str, statement: &str) -> CopybookResult<u8> {
    if token.len() > 2 {
        return Err(statement_err(statement, "level number has more than two digits"));
    }
    let level: u8 = token
        .parse()
        .map_err(|_| statement_err(statement, "level number is not a number"))?;
    match level {
        1..=49 | 88 => Ok(level),
        _ => Err(statement_err(statement, "level number out of range")),
    }
}

fn parse_usage(token: &str) -> CopybookResult<Usage> {
    Usage::parse(token).ok_or_else(|| {
        CopybookError::new(
            function!(),
            CopybookErrorKind::UnknownUsage {
                usage: token.to_owned(),
            },
        )
    })
}

/// Takes a VALUE literal, re-joining quoted literals that were split on
/// whitespace. Surrounding quotes are stripped.
fn take_literal(tokens: &[&str], idx: &mut usize, statement: &str) -> CopybookResult<String> {
    let Some(&first) = tokens.get(*idx) else {
        return Err(statement_err(statement, "VALUE clause has no literal"));
    };
    *idx += 1;

    let quote = match first.as_bytes().first() {
        Some(&q @ (b'\'' | b'"')) => q,
        _ => return Ok(first.to_owned()),
    };

    let mut literal = first.to_owned();
    while !(literal.len() >= 2 && literal.as_bytes().last() == Some(&quote)) {
        let Some(&next) = tokens.get(*idx) else {
            return Err(statement_err(statement, "unterminated quoted literal"));
        };
        *idx += 1;
        literal.push(' ');
        literal.push_str(next);
    }

    Ok(literal[1..literal.len() - 1].to_owned())
}

fn is_clause_keyword(token: &str) -> bool {
    let token = token.to_ascii_uppercase();
    matches!(
        token.as_str(),
        "PIC"
            | "PICTURE"
            | "USAGE"
            | "OCCURS"
            | "REDEFINES"
            | "VALUE"
            | "VALUES"
            | "JUSTIFIED"
            | "JUST"
            | "BLANK"
            | "SIGN"
            | "SYNCHRONIZED"
            | "SYNC"
    ) || Usage::parse(&token).is_some()
}

/// Consumes `IS` noise words.
fn skip_noise(tokens: &[&str], idx: &mut usize) {
    while tokens.get(*idx).is_some_and(|t| t.eq_ignore_ascii_case("IS")) {
        *idx += 1;
    }
}

/// Consumes the given keyword if it is next; returns whether it was present.
fn consume_keyword(tokens: &[&str], idx: &mut usize, keyword: &str) -> bool {
    if tokens.get(*idx).is_some_and(|t| t.eq_ignore_ascii_case(keyword)) {
        *idx += 1;
        true
    } else {
        false
    }
}

fn statement_err(statement: &str, reason: &'static str) -> CopybookError {
    CopybookError::new(
        function!(),
        CopybookErrorKind::Statement {
            statement: statement.to_owned(),
            reason,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUSTOMER: &str = "
       01  CUSTOMER-RECORD.
           05  CUST-ID            PIC 9(6).
           05  CUST-NAME          PIC X(20).
           05  CUST-BALANCE       PIC S9(7)V99 COMP-3.
           05  CUST-STATUS        PIC X.
               88  ACTIVE         VALUE 'A'.
               88  CLOSED         VALUE 'C'.
           05  FILLER             PIC X(3).
    ";

    #[test]
    fn parses_levels_into_a_tree() {
        let schema = parse(CUSTOMER).unwrap();
        let root = schema.field(schema.root());
        assert_eq!(root.children.len(), 1);

        let record = schema.field(root.children[0]);
        assert_eq!(record.name, "CUSTOMER-RECORD");
        assert_eq!(record.level, 1);
        assert_eq!(record.children.len(), 5);
        assert!(record.is_group());
    }

    #[test]
    fn parses_clauses() {
        let schema = parse(CUSTOMER).unwrap();
        let balance = schema.field(schema.find("CUST-BALANCE").unwrap());
        assert_eq!(balance.usage(), Usage::PackedDecimal);
        let pic = balance.picture.as_ref().unwrap();
        assert!(pic.signed());
        assert_eq!(pic.digits(), 9);
        assert_eq!(pic.scale(), 2);
    }

    #[test]
    fn conditions_attach_to_their_parent() {
        let schema = parse(CUSTOMER).unwrap();
        let status = schema.field(schema.find("CUST-STATUS").unwrap());
        assert_eq!(status.conditions.len(), 2);
        assert_eq!(status.conditions[0].name, "ACTIVE");
        assert_eq!(status.conditions[0].literal, "A");
    }

    #[test]
    fn filler_is_flagged() {
        let schema = parse(CUSTOMER).unwrap();
        let record = schema.field(schema.find("CUSTOMER-RECORD").unwrap());
        let last = schema.field(*record.children.last().unwrap());
        assert!(last.is_filler());
    }

    #[test]
    fn comments_are_stripped() {
        let text = "
      * fixed-form comment in the indicator column
       01 REC. *> trailing comment
           05 A PIC X. *> another
    ";
        let schema = parse(text).unwrap();
        assert!(schema.find("A").is_some());
    }

    #[test]
    fn clause_order_is_free() {
        let text = "01 R. 05 N OCCURS 3 TIMES PIC 9(2) USAGE IS DISPLAY.";
        let schema = parse(text).unwrap();
        let n = schema.field(schema.find("N").unwrap());
        assert_eq!(n.occurs, Some(3));
        assert_eq!(n.usage(), Usage::Display);
    }

    #[test]
    fn sign_clause() {
        let text = "01 R. 05 AMT PIC S9(5) SIGN IS LEADING SEPARATE CHARACTER.";
        let schema = parse(text).unwrap();
        let amt = schema.field(schema.find("AMT").unwrap());
        assert!(amt.flags.contains(FieldFlags::SIGN_LEADING));
        assert!(amt.flags.contains(FieldFlags::SIGN_SEPARATE));
    }

    #[test]
    fn quoted_value_with_spaces() {
        let text = "01 R. 05 CITY PIC X(8) VALUE 'NEW YORK'.";
        let schema = parse(text).unwrap();
        let city = schema.field(schema.find("CITY").unwrap());
        assert_eq!(city.value.as_deref(), Some("NEW YORK"));
    }

    #[test]
    fn implicit_filler_without_name() {
        let text = "01 R. 05 PIC X(4).";
        let schema = parse(text).unwrap();
        let r = schema.field(schema.find("R").unwrap());
        assert!(schema.field(r.children[0]).is_filler());
    }

    #[test]
    fn bad_levels_fail_fast() {
        assert!(parse("123 R PIC X.").is_err());
        assert!(parse("00 R PIC X.").is_err());
        assert!(parse("66 R PIC X.").is_err());
    }

    #[test]
    fn unknown_usage_fails() {
        assert!(parse("01 R. 05 A PIC 9 USAGE COMP-9.").is_err());
    }

    #[test]
    fn condition_without_parent_fails() {
        assert!(parse("88 LONELY VALUE 'X'.").is_err());
    }

    #[test]
    fn non_entry_statements_are_skipped() {
        let schema = parse("SKIP1. 01 R. 05 A PIC X.").unwrap();
        assert!(schema.find("A").is_some());
    }
}
