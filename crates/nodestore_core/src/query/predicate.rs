//! Boolean query expressions over node fields.
//!
//! # Responsibility
//! - Represent field/operator/literal comparisons and their AND/OR groups.
//! - Compose a kind's fixed predicate with a caller predicate.
//! - Evaluate predicates against in-memory records.
//!
//! # Invariants
//! - `&` and `|` flatten nested groups of the same connective, so composition
//!   is associative: `(a & b) & c == a & (b & c)`.
//! - In-memory evaluation follows SQLite comparison rules for the `nodes`
//!   column affinities, so `matches` agrees with repository queries.
//!
//! SQL rendering lives in the repository layer; this module is storage-agnostic.

use crate::model::node::NodeRecord;
use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::{BitAnd, BitOr};

/// Queryable node field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    Category,
    Name,
    Number,
}

impl Field {
    /// Field name as used in query expressions and as the SQL column name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Category => "category",
            Self::Name => "name",
            Self::Number => "number",
        }
    }

    /// Parses a field name. `_id` is accepted as an alias of `id`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "id" | "_id" => Some(Self::Id),
            "category" => Some(Self::Category),
            "name" => Some(Self::Name),
            "number" => Some(Self::Number),
            _ => None,
        }
    }

    fn is_integer(self) -> bool {
        matches!(self, Self::Number)
    }
}

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    /// Substring match on the text form of the field.
    Contains,
    /// Prefix match on the text form of the field.
    StartsWith,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Contains => "contains",
            Self::StartsWith => "startswith",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "eq" => Some(Self::Eq),
            "ne" => Some(Self::Ne),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "contains" => Some(Self::Contains),
            "startswith" => Some(Self::StartsWith),
            _ => None,
        }
    }

    fn is_text_only(self) -> bool {
        matches!(self, Self::Contains | Self::StartsWith)
    }
}

/// Literal operand of a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    Text(String),
    Integer(i64),
}

impl Literal {
    fn to_text(&self) -> String {
        match self {
            Self::Text(value) => value.clone(),
            Self::Integer(value) => value.to_string(),
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(value) => write!(f, "{value:?}"),
            Self::Integer(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

/// Errors from string-form predicate construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredicateError {
    UnknownField(String),
    UnknownOperator(String),
    /// Operator or literal type does not fit the field type.
    TypeMismatch {
        field: Field,
        operator: Operator,
        value: Literal,
    },
}

impl Display for PredicateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownField(value) => write!(f, "unknown query field `{value}`"),
            Self::UnknownOperator(value) => write!(f, "unknown query operator `{value}`"),
            Self::TypeMismatch {
                field,
                operator,
                value,
            } => write!(
                f,
                "operator `{}` with value {value} does not apply to field `{}`",
                operator.as_str(),
                field.as_str()
            ),
        }
    }
}

impl Error for PredicateError {}

/// Boolean query expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Predicate {
    Compare {
        field: Field,
        op: Operator,
        value: Literal,
    },
    /// Matches when every member matches. Empty matches everything.
    And(Vec<Predicate>),
    /// Matches when any member matches. Empty matches nothing.
    Or(Vec<Predicate>),
}

impl Predicate {
    /// Builds a comparison from string field/operator names.
    ///
    /// # Errors
    /// - Unknown field or operator names.
    /// - Integer fields compared with text literals, text fields compared
    ///   with integer literals, and substring operators on integer fields.
    pub fn new(
        field: &str,
        op: &str,
        value: impl Into<Literal>,
    ) -> Result<Self, PredicateError> {
        let field =
            Field::parse(field).ok_or_else(|| PredicateError::UnknownField(field.to_string()))?;
        let op =
            Operator::parse(op).ok_or_else(|| PredicateError::UnknownOperator(op.to_string()))?;
        Self::compare(field, op, value)
    }

    /// Typed comparison with the same checks as [`Predicate::new`].
    pub fn compare(
        field: Field,
        op: Operator,
        value: impl Into<Literal>,
    ) -> Result<Self, PredicateError> {
        let value = value.into();
        let literal_is_integer = matches!(value, Literal::Integer(_));
        let fits = if field.is_integer() {
            literal_is_integer && !op.is_text_only()
        } else {
            !literal_is_integer
        };
        if !fits {
            return Err(PredicateError::TypeMismatch {
                field,
                operator: op,
                value,
            });
        }
        Ok(Self::Compare { field, op, value })
    }

    /// Equality shorthand. Does not type-check the literal.
    pub fn eq(field: Field, value: impl Into<Literal>) -> Self {
        Self::Compare {
            field,
            op: Operator::Eq,
            value: value.into(),
        }
    }

    /// Evaluates this predicate against one record.
    pub fn matches(&self, record: &NodeRecord) -> bool {
        match self {
            Self::Compare { field, op, value } => {
                compare_field(&record_value(record, *field), *op, value)
            }
            Self::And(members) => members.iter().all(|member| member.matches(record)),
            Self::Or(members) => members.iter().any(|member| member.matches(record)),
        }
    }

    fn into_and_members(self) -> Vec<Predicate> {
        match self {
            Self::And(members) => members,
            other => vec![other],
        }
    }

    fn into_or_members(self) -> Vec<Predicate> {
        match self {
            Self::Or(members) => members,
            other => vec![other],
        }
    }
}

impl BitAnd for Predicate {
    type Output = Predicate;

    fn bitand(self, rhs: Self) -> Self::Output {
        let mut members = self.into_and_members();
        members.extend(rhs.into_and_members());
        Predicate::And(members)
    }
}

impl BitOr for Predicate {
    type Output = Predicate;

    fn bitor(self, rhs: Self) -> Self::Output {
        let mut members = self.into_or_members();
        members.extend(rhs.into_or_members());
        Predicate::Or(members)
    }
}

impl Display for Predicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Compare { field, op, value } => {
                write!(f, "{} {} {value}", field.as_str(), op.as_str())
            }
            Self::And(members) => write_group(f, members, " AND ", "TRUE"),
            Self::Or(members) => write_group(f, members, " OR ", "FALSE"),
        }
    }
}

fn write_group(
    f: &mut Formatter<'_>,
    members: &[Predicate],
    separator: &str,
    empty: &str,
) -> std::fmt::Result {
    if members.is_empty() {
        return f.write_str(empty);
    }
    f.write_str("(")?;
    for (index, member) in members.iter().enumerate() {
        if index > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{member}")?;
    }
    f.write_str(")")
}

/// Combines a kind's fixed predicate with an optional caller predicate.
///
/// - neither present: `None` (unconstrained)
/// - one present: that one
/// - both present: `fixed AND caller`
pub fn compose(fixed: Option<&Predicate>, caller: Option<Predicate>) -> Option<Predicate> {
    match (fixed, caller) {
        (None, None) => None,
        (Some(fixed), None) => Some(fixed.clone()),
        (None, Some(caller)) => Some(caller),
        (Some(fixed), Some(caller)) => Some(fixed.clone() & caller),
    }
}

fn record_value(record: &NodeRecord, field: Field) -> Literal {
    match field {
        Field::Id => Literal::Text(record.id.to_string()),
        Field::Category => Literal::Text(record.category.as_str().to_string()),
        Field::Name => Literal::Text(record.name.clone()),
        Field::Number => Literal::Integer(record.number),
    }
}

fn compare_field(stored: &Literal, op: Operator, operand: &Literal) -> bool {
    match op {
        Operator::Contains => stored.to_text().contains(operand.to_text().as_str()),
        Operator::StartsWith => stored.to_text().starts_with(operand.to_text().as_str()),
        _ => {
            let ordering = sqlite_ordering(stored, operand);
            match op {
                Operator::Eq => ordering == Ordering::Equal,
                Operator::Ne => ordering != Ordering::Equal,
                Operator::Lt => ordering == Ordering::Less,
                Operator::Lte => ordering != Ordering::Greater,
                Operator::Gt => ordering == Ordering::Greater,
                Operator::Gte => ordering != Ordering::Less,
                Operator::Contains | Operator::StartsWith => false,
            }
        }
    }
}

// Text columns coerce integer operands to text. The integer column applies
// numeric affinity to text operands; text that stays text sorts after every
// number.
fn sqlite_ordering(stored: &Literal, operand: &Literal) -> Ordering {
    match (stored, operand) {
        (Literal::Text(left), Literal::Text(right)) => left.as_bytes().cmp(right.as_bytes()),
        (Literal::Text(left), Literal::Integer(right)) => {
            left.as_bytes().cmp(right.to_string().as_bytes())
        }
        (Literal::Integer(left), Literal::Integer(right)) => left.cmp(right),
        (Literal::Integer(left), Literal::Text(right)) => match numeric_affinity(right) {
            Some(Numeric::Integer(parsed)) => left.cmp(&parsed),
            // i64 -> f64 loses precision past 2^53, as SQLite's own comparison does.
            Some(Numeric::Real(parsed)) => {
                (*left as f64).partial_cmp(&parsed).unwrap_or(Ordering::Less)
            }
            None => Ordering::Less,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Numeric {
    Integer(i64),
    Real(f64),
}

/// Converts text the way SQLite's NUMERIC affinity does: well-formed integer
/// or real literals (surrounding spaces allowed) become numbers, anything else
/// stays text.
fn numeric_affinity(text: &str) -> Option<Numeric> {
    let trimmed = text.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(Numeric::Integer(value));
    }

    // Rust also accepts `inf`/`NaN` spellings that SQLite leaves as text.
    let has_digit = trimmed.bytes().any(|byte| byte.is_ascii_digit());
    let literal_bytes = trimmed
        .bytes()
        .all(|byte| byte.is_ascii_digit() || matches!(byte, b'+' | b'-' | b'.' | b'e' | b'E'));
    if !has_digit || !literal_bytes {
        return None;
    }

    let value = trimmed.parse::<f64>().ok().filter(|value| value.is_finite())?;
    if value.fract() == 0.0 && value >= i64::MIN as f64 && value < i64::MAX as f64 {
        return Some(Numeric::Integer(value as i64));
    }
    Some(Numeric::Real(value))
}

#[cfg(test)]
mod tests {
    use super::{
        compose, numeric_affinity, Field, Literal, Numeric, Operator, Predicate, PredicateError,
    };
    use crate::kind::NodeKind;
    use crate::model::node::{NodeFields, NodeRecord};

    fn category(value: &str) -> Predicate {
        Predicate::eq(Field::Category, value)
    }

    #[test]
    fn string_form_constructor_parses_field_and_operator() {
        let predicate = Predicate::new("category", "eq", "folder").expect("valid predicate");
        assert_eq!(predicate, category("folder"));

        let by_legacy_id = Predicate::new("_id", "eq", "abc").expect("alias accepted");
        assert!(matches!(
            by_legacy_id,
            Predicate::Compare {
                field: Field::Id,
                ..
            }
        ));
    }

    #[test]
    fn string_form_constructor_rejects_unknown_names_and_type_mismatches() {
        assert_eq!(
            Predicate::new("colour", "eq", "red").unwrap_err(),
            PredicateError::UnknownField("colour".to_string())
        );
        assert_eq!(
            Predicate::new("name", "like", "x").unwrap_err(),
            PredicateError::UnknownOperator("like".to_string())
        );
        assert!(matches!(
            Predicate::new("number", "eq", "31").unwrap_err(),
            PredicateError::TypeMismatch { .. }
        ));
        assert!(matches!(
            Predicate::new("number", "contains", 3).unwrap_err(),
            PredicateError::TypeMismatch { .. }
        ));
        assert!(matches!(
            Predicate::new("name", "eq", 3).unwrap_err(),
            PredicateError::TypeMismatch { .. }
        ));
    }

    #[test]
    fn and_composition_is_associative() {
        let a = category("folder");
        let b = Predicate::eq(Field::Name, "x");
        let c = Predicate::eq(Field::Number, 2);

        let left = (a.clone() & b.clone()) & c.clone();
        let right = a & (b & c);
        assert_eq!(left, right);
        assert!(matches!(left, Predicate::And(ref members) if members.len() == 3));
    }

    #[test]
    fn or_groups_stay_nested_under_and() {
        let fixed = category("folder") | category("dashboard");
        let composed = fixed.clone() & Predicate::eq(Field::Name, "Dashboard");
        match composed {
            Predicate::And(members) => {
                assert_eq!(members.len(), 2);
                assert_eq!(members[0], fixed);
            }
            other => panic!("unexpected predicate: {other}"),
        }
    }

    #[test]
    fn compose_follows_presence_rules() {
        let fixed = category("data");
        let caller = Predicate::eq(Field::Name, "My Raw Data");

        assert_eq!(compose(None, None), None);
        assert_eq!(compose(Some(&fixed), None), Some(fixed.clone()));
        assert_eq!(compose(None, Some(caller.clone())), Some(caller.clone()));
        assert_eq!(
            compose(Some(&fixed), Some(caller.clone())),
            Some(fixed & caller)
        );
    }

    #[test]
    fn matches_evaluates_comparisons_and_groups() {
        let record = NodeRecord::new(
            NodeKind::Data,
            NodeFields::named("My Raw Data").with_number(31),
        );

        assert!(category("data").matches(&record));
        assert!(!category("dashboard").matches(&record));
        assert!((category("folder") | category("data")).matches(&record));
        assert!(!(category("data") & Predicate::eq(Field::Number, 1)).matches(&record));
        assert!(Predicate::compare(Field::Number, Operator::Gt, 30)
            .unwrap()
            .matches(&record));
        assert!(Predicate::compare(Field::Name, Operator::Contains, "Raw")
            .unwrap()
            .matches(&record));
        assert!(Predicate::compare(Field::Name, Operator::StartsWith, "My ")
            .unwrap()
            .matches(&record));
        assert!(Predicate::And(Vec::new()).matches(&record));
        assert!(!Predicate::Or(Vec::new()).matches(&record));
    }

    #[test]
    fn integer_field_coerces_numeric_text_like_sqlite() {
        let record = NodeRecord::new(NodeKind::Data, NodeFields::default().with_number(31));
        assert!(Predicate::eq(Field::Number, "31").matches(&record));
        assert!(!Predicate::eq(Field::Number, "thirty-one").matches(&record));
        assert!(Predicate::eq(Field::Number, "31.0").matches(&record));
        assert!(Predicate::eq(Field::Number, " 3.1e1 ").matches(&record));
        assert!(!Predicate::eq(Field::Number, "inf").matches(&record));
        assert!(Predicate::Compare {
            field: Field::Number,
            op: Operator::Lt,
            value: Literal::from("31.5"),
        }
        .matches(&record));
        assert!(Predicate::compare(Field::Number, Operator::Lt, 40)
            .unwrap()
            .matches(&record));
    }

    #[test]
    fn numeric_affinity_accepts_only_well_formed_literals() {
        assert_eq!(numeric_affinity("+31"), Some(Numeric::Integer(31)));
        assert_eq!(numeric_affinity("31.0"), Some(Numeric::Integer(31)));
        assert_eq!(numeric_affinity("3.1e1"), Some(Numeric::Integer(31)));
        assert_eq!(numeric_affinity("2.5"), Some(Numeric::Real(2.5)));
        assert_eq!(numeric_affinity("NaN"), None);
        assert_eq!(numeric_affinity("0x1F"), None);
        assert_eq!(numeric_affinity(""), None);
    }

    #[test]
    fn display_renders_readable_expression() {
        let predicate = (category("folder") | category("dashboard"))
            & Predicate::eq(Field::Number, Literal::Integer(1));
        assert_eq!(
            predicate.to_string(),
            "((category eq \"folder\" OR category eq \"dashboard\") AND number eq 1)"
        );
    }
}
