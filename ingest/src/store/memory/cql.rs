//! Parser for the CQL subset understood by [`super::MemoryStore`].
//!
//! Supported statements:
//!
//! - `CREATE TABLE [IF NOT EXISTS] t (col type, …, PRIMARY KEY ((p, …), c, …))
//!   [WITH CLUSTERING ORDER BY (c ASC|DESC, …)]`
//! - `INSERT INTO t (col, …) VALUES (?, …)`
//! - `BEGIN [LOGGED | UNLOGGED] BATCH <insert>; … APPLY BATCH`
//! - `SELECT * | col, … FROM t [WHERE col = ?]`
//!
//! Values are only ever supplied through bind markers. Unquoted identifiers are folded to
//! lower case.

use winnow::ascii::{Caseless, multispace0};
use winnow::combinator::{
    alt, cut_err, delimited, fail, not, opt, preceded, repeat, separated, terminated,
};
use winnow::error::{StrContext, StrContextValue};
use winnow::token::{literal, one_of, take_while};
use winnow::{ModalResult, Parser};

use crate::error::{ErrorKind, IngestResult};
use crate::ingest_error;
use crate::types::ColumnType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ClusteringOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct ColumnDefinition {
    pub name: String,
    pub column_type: ColumnType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct TableDefinition {
    pub name: String,
    pub if_not_exists: bool,
    pub columns: Vec<ColumnDefinition>,
    pub partition_key: Vec<String>,
    pub clustering_key: Vec<String>,
    /// Explicit `WITH CLUSTERING ORDER BY` entries; unlisted clustering columns are ascending.
    pub clustering_order: Vec<(String, ClusteringOrder)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Insert {
    pub table: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Projection {
    All,
    Columns(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Select {
    pub table: String,
    pub projection: Projection,
    /// Column restricted by `WHERE col = ?`.
    pub restriction: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Statement {
    CreateTable(TableDefinition),
    Insert(Insert),
    Batch(Vec<Insert>),
    Select(Select),
}

impl Statement {
    /// Number of `?` markers the statement expects values for.
    pub fn bind_marker_count(&self) -> usize {
        match self {
            Statement::CreateTable(_) => 0,
            Statement::Insert(insert) => insert.columns.len(),
            Statement::Batch(inserts) => inserts.iter().map(|insert| insert.columns.len()).sum(),
            Statement::Select(select) => usize::from(select.restriction.is_some()),
        }
    }
}

/// Parses a single statement. A trailing `;` is allowed.
pub(super) fn parse(cql: &str) -> IngestResult<Statement> {
    terminated(statement, (opt(symbol(';')), multispace0))
        .parse(cql)
        .map_err(|err| {
            ingest_error!(
                ErrorKind::InvalidStatement,
                "Statement could not be parsed",
                err
            )
        })
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Matches a keyword in any case, but not as the prefix of a longer identifier.
fn keyword(word: &'static str) -> impl FnMut(&mut &str) -> ModalResult<()> {
    move |input: &mut &str| {
        preceded(
            multispace0,
            terminated(literal(Caseless(word)), not(one_of(is_ident_char))),
        )
        .void()
        .parse_next(input)
    }
}

fn symbol(c: char) -> impl FnMut(&mut &str) -> ModalResult<()> {
    move |input: &mut &str| preceded(multispace0, c).void().parse_next(input)
}

fn identifier(input: &mut &str) -> ModalResult<String> {
    preceded(
        multispace0,
        (one_of(is_ident_start), take_while(0.., is_ident_char)).take(),
    )
    .map(str::to_ascii_lowercase)
    .context(StrContext::Label("identifier"))
    .parse_next(input)
}

/// `(ident, …)`
fn identifier_list(input: &mut &str) -> ModalResult<Vec<String>> {
    delimited(
        symbol('('),
        separated(1.., identifier, symbol(',')),
        symbol(')'),
    )
    .parse_next(input)
}

/// Fails without backtracking, reporting what was expected at this point.
fn reject<T>(input: &mut &str, expected: &'static str) -> ModalResult<T> {
    cut_err(fail.context(StrContext::Expected(StrContextValue::Description(expected))))
        .parse_next(input)
}

fn statement(input: &mut &str) -> ModalResult<Statement> {
    alt((
        create_table.map(Statement::CreateTable),
        insert.map(Statement::Insert),
        batch.map(Statement::Batch),
        select.map(Statement::Select),
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "CREATE TABLE, INSERT, BEGIN BATCH or SELECT",
    )))
    .parse_next(input)
}

enum TableElement {
    Column {
        definition: ColumnDefinition,
        primary_key: bool,
    },
    PrimaryKey {
        partition_key: Vec<String>,
        clustering_key: Vec<String>,
    },
}

fn create_table(input: &mut &str) -> ModalResult<TableDefinition> {
    (keyword("create"), keyword("table")).parse_next(input)?;

    let if_not_exists = opt((keyword("if"), keyword("not"), keyword("exists")))
        .parse_next(input)?
        .is_some();
    let name = cut_err(identifier).parse_next(input)?;

    let elements: Vec<TableElement> = cut_err(delimited(
        symbol('('),
        // A trailing comma before the closing parenthesis is tolerated.
        terminated(separated(1.., table_element, symbol(',')), opt(symbol(','))),
        symbol(')'),
    ))
    .parse_next(input)?;
    let order = opt(clustering_order).parse_next(input)?;

    let mut columns = Vec::with_capacity(elements.len());
    let mut key = None;
    for element in elements {
        match element {
            TableElement::Column {
                definition,
                primary_key,
            } => {
                if primary_key {
                    key = Some((vec![definition.name.clone()], Vec::new()));
                }
                columns.push(definition);
            }
            TableElement::PrimaryKey {
                partition_key,
                clustering_key,
            } => key = Some((partition_key, clustering_key)),
        }
    }

    let Some((partition_key, clustering_key)) = key else {
        return reject(input, "a PRIMARY KEY in the table definition");
    };

    Ok(TableDefinition {
        name,
        if_not_exists,
        columns,
        partition_key,
        clustering_key,
        clustering_order: order.unwrap_or_default(),
    })
}

fn table_element(input: &mut &str) -> ModalResult<TableElement> {
    alt((
        preceded((keyword("primary"), keyword("key")), cut_err(primary_key)).map(
            |(partition_key, clustering_key)| TableElement::PrimaryKey {
                partition_key,
                clustering_key,
            },
        ),
        (
            identifier,
            cut_err(column_type),
            opt((keyword("primary"), keyword("key"))),
        )
            .map(|(name, column_type, primary_key)| TableElement::Column {
                definition: ColumnDefinition { name, column_type },
                primary_key: primary_key.is_some(),
            }),
    ))
    .parse_next(input)
}

/// `((p, …), c, …)` or `(p, c, …)`
fn primary_key(input: &mut &str) -> ModalResult<(Vec<String>, Vec<String>)> {
    delimited(
        symbol('('),
        (
            alt((identifier_list, identifier.map(|column| vec![column]))),
            repeat(0.., preceded(symbol(','), identifier)),
        ),
        symbol(')'),
    )
    .parse_next(input)
}

fn text_type(input: &mut &str) -> ModalResult<()> {
    alt((keyword("text"), keyword("varchar"))).parse_next(input)
}

fn column_type(input: &mut &str) -> ModalResult<ColumnType> {
    alt((
        text_type.value(ColumnType::Text),
        keyword("int").value(ColumnType::Int),
        keyword("timestamp").value(ColumnType::Timestamp),
        (keyword("set"), symbol('<'), text_type, symbol('>')).value(ColumnType::TextSet),
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "text, int, timestamp or set<text>",
    )))
    .parse_next(input)
}

/// `WITH CLUSTERING ORDER BY (c ASC|DESC, …)`; a column without a direction is ascending.
fn clustering_order(input: &mut &str) -> ModalResult<Vec<(String, ClusteringOrder)>> {
    let direction = alt((
        keyword("asc").value(ClusteringOrder::Asc),
        keyword("desc").value(ClusteringOrder::Desc),
    ));

    preceded(
        (
            keyword("with"),
            keyword("clustering"),
            keyword("order"),
            keyword("by"),
        ),
        cut_err(delimited(
            symbol('('),
            separated(
                1..,
                (identifier, opt(direction))
                    .map(|(column, order)| (column, order.unwrap_or(ClusteringOrder::Asc))),
                symbol(','),
            ),
            symbol(')'),
        )),
    )
    .parse_next(input)
}

fn insert(input: &mut &str) -> ModalResult<Insert> {
    (keyword("insert"), keyword("into")).parse_next(input)?;

    let (table, columns, markers) = cut_err((
        identifier,
        identifier_list,
        preceded(keyword("values"), bind_markers),
    ))
    .parse_next(input)?;

    if markers != columns.len() {
        return reject(input, "one `?` per listed column");
    }

    Ok(Insert { table, columns })
}

/// `(?, …)`, returning the number of markers.
fn bind_markers(input: &mut &str) -> ModalResult<usize> {
    delimited(
        symbol('('),
        separated(1.., symbol('?'), symbol(',')),
        symbol(')'),
    )
    .map(|markers: Vec<()>| markers.len())
    .context(StrContext::Expected(StrContextValue::Description(
        "bind markers; literal values are not supported",
    )))
    .parse_next(input)
}

fn batch(input: &mut &str) -> ModalResult<Vec<Insert>> {
    (
        keyword("begin"),
        opt(alt((keyword("unlogged"), keyword("logged")))),
        keyword("batch"),
    )
        .parse_next(input)?;

    cut_err(terminated(
        repeat(1.., terminated(insert, opt(symbol(';')))),
        (keyword("apply"), keyword("batch")),
    ))
    .parse_next(input)
}

fn select(input: &mut &str) -> ModalResult<Select> {
    keyword("select").parse_next(input)?;

    let projection = alt((
        symbol('*').value(Projection::All),
        separated(1.., identifier, symbol(',')).map(Projection::Columns),
    ));
    let restriction = preceded(
        keyword("where"),
        terminated(identifier, (symbol('='), symbol('?'))),
    );

    cut_err((projection, preceded(keyword("from"), identifier), opt(restriction)))
        .map(|(projection, table, restriction)| Select {
            table,
            projection,
            restriction,
        })
        .parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_table_with_composite_key_and_clustering_order() {
        let statement = parse(
            "CREATE TABLE IF NOT EXISTS reviews_by_item (asin text, time timestamp, \
             reviewerId text, rating int, PRIMARY KEY ((asin), time, reviewerId)) \
             WITH CLUSTERING ORDER BY (time DESC, reviewerId ASC);",
        )
        .unwrap();

        let Statement::CreateTable(table) = statement else {
            panic!("expected a table definition");
        };
        assert!(table.if_not_exists);
        assert_eq!(table.name, "reviews_by_item");
        assert_eq!(table.columns.len(), 4);
        assert_eq!(table.partition_key, vec!["asin"]);
        assert_eq!(table.clustering_key, vec!["time", "reviewerid"]);
        assert_eq!(
            table.clustering_order,
            vec![
                ("time".to_owned(), ClusteringOrder::Desc),
                ("reviewerid".to_owned(), ClusteringOrder::Asc),
            ]
        );
    }

    #[test]
    fn parses_inline_primary_key_and_set_type() {
        let Statement::CreateTable(table) =
            parse("create table items (asin text primary key, categories set<text>)").unwrap()
        else {
            panic!("expected a table definition");
        };

        assert_eq!(table.partition_key, vec!["asin"]);
        assert!(table.clustering_key.is_empty());
        assert_eq!(table.columns[1].column_type, ColumnType::TextSet);
    }

    #[test]
    fn parses_batch_of_inserts() {
        let statement = parse(
            "BEGIN BATCH INSERT INTO a (x, y) VALUES (?, ?); \
             INSERT INTO b (y, x) VALUES (?, ?); APPLY BATCH",
        )
        .unwrap();

        assert_eq!(statement.bind_marker_count(), 4);
        let Statement::Batch(inserts) = statement else {
            panic!("expected a batch");
        };
        assert_eq!(inserts[1].table, "b");
        assert_eq!(inserts[1].columns, vec!["y", "x"]);
    }

    #[test]
    fn parses_restricted_select() {
        let statement = parse("SELECT * FROM items WHERE asin = ?").unwrap();
        assert_eq!(
            statement,
            Statement::Select(Select {
                table: "items".to_owned(),
                projection: Projection::All,
                restriction: Some("asin".to_owned()),
            })
        );
        assert_eq!(statement.bind_marker_count(), 1);
    }

    #[test]
    fn rejects_mismatched_insert() {
        let err = parse("INSERT INTO a (x, y) VALUES (?)").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStatement);
    }

    #[test]
    fn rejects_literals_and_unknown_statements() {
        assert!(parse("SELECT * FROM a WHERE x = 'literal'").is_err());
        assert!(parse("DROP TABLE a").is_err());
        assert!(parse("CREATE TABLE a (x text)").is_err());
        assert!(parse("INSERT INTO a (x) VALUES ('literal')").is_err());
        assert!(parse("BEGIN BATCH APPLY BATCH").is_err());
    }

    #[test]
    fn keywords_need_a_word_boundary() {
        assert!(parse("SELECT * FROMitems").is_err());
        assert!(parse("select asin from items where asin=?;").is_ok());
    }

    #[test]
    fn trailing_comma_and_unlogged_batches_are_accepted() {
        assert!(parse("CREATE TABLE t (a text, b int, PRIMARY KEY (a, b),)").is_ok());

        let statement =
            parse("BEGIN UNLOGGED BATCH INSERT INTO t (a) VALUES (?) APPLY BATCH;").unwrap();
        assert_eq!(statement.bind_marker_count(), 1);
    }

    #[test]
    fn parse_errors_point_at_the_input() {
        let err = parse("SELECT * FROM").unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidStatement);
        assert!(err.detail().unwrap().contains("SELECT * FROM"));
    }
}
