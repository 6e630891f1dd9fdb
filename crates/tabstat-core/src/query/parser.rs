//! Expression matcher
//!
//! Recognizes a fixed catalog of pandas/scipy-like call shapes and turns
//! them into a [`Command`]. Shapes are tried in priority order: table
//! operations first, then inferential and predictive functions. The table
//! reference in front of an expression is an optional identifier (`df`,
//! `t`, or nothing at all).
//!
//! An operand outside its valid range is rejected here, but the rejection
//! keeps the columns the expression names. The dispatcher checks those
//! first, so a missing column wins over a bad operand.

use super::command::{
    Aggregation, ColumnStat, Command, CompareOp, MatrixKind, Predicate, SeriesRef,
};
use crate::errors::QueryError;
use crate::models::MAX_FORECAST_PERIODS;
use crate::table::Value;
use crate::types::EngineOptions;
use log::trace;
use regex::Regex;
use std::sync::LazyLock;

/// Optional table identifier
const T: &str = r"(?:[A-Za-z_]\w*)?";
/// `['col']` or `[['a', 'b']]`, captured
const SEL: &str = r#"(\[\s*\[[^\]]*\]\s*\]|\[\s*['"][^'"]+['"]\s*\])"#;
/// `df['col'] OP literal` or `col OP literal`, no captures
const PRED: &str = r#"(?:[A-Za-z_]\w*\s*\[\s*['"][^'"]+['"]\s*\]|[A-Za-z_]\w*)\s*(?:>=|<=|==|!=|>|<)\s*(?:'[^']*'|"[^"]*"|[^\[\]\s]+)"#;

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static query pattern must compile")
}

static HEAD_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(&format!(r"^{T}\.(head|tail)\(\s*(?:n\s*=\s*)?(\d*)\s*\)$")));
static SHAPE_RE: LazyLock<Regex> = LazyLock::new(|| compile(&format!(r"^{T}\.shape$")));
static COLUMNS_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(&format!(r"^{T}\.columns(?:\.tolist\(\s*\))?$")));
static DTYPES_RE: LazyLock<Regex> = LazyLock::new(|| compile(&format!(r"^{T}\.dtypes$")));
static INFO_RE: LazyLock<Regex> = LazyLock::new(|| compile(&format!(r"^{T}\.info\(\s*\)$")));
static LEN_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"^len\(\s*[A-Za-z_]\w*\s*\)$"));
static DESCRIBE_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(&format!(r"^{T}{SEL}?\.describe\(\s*\)$")));
static VALUE_COUNTS_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r#"^{T}\[\s*['"]([^'"]+)['"]\s*\]\.value_counts\(\s*\)$"#
    ))
});
static GROUPBY_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r#"^{T}\.groupby\(\s*(?:by\s*=\s*)?(\[[^\]]*\]|['"][^'"]+['"])\s*\)(?:\[\s*['"]([^'"]+)['"]\s*\])?\.(?:agg\(\s*(?:['"]([^'"]*)['"])?\s*\)|([a-z_]+)\(\s*\))$"#
    ))
});
static SORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r#"^{T}\.sort_values\(\s*(?:by\s*=\s*)?['"]([^'"]+)['"]\s*(?:,\s*ascending\s*=\s*(True|False|true|false)\s*)?\)$"#
    ))
});
static MATRIX_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(&format!(r"^{T}(\[\s*\[[^\]]*\]\s*\])?\.(corr|cov)\(\s*\)$")));
static PAIR_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r#"^{T}\[\s*['"]([^'"]+)['"]\s*\]\.(corr|cov)\(\s*{T}\[\s*['"]([^'"]+)['"]\s*\]\s*\)$"#
    ))
});
static QUANTILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r#"^{T}\[\s*['"]([^'"]+)['"]\s*\]\.quantile\(\s*(?:q\s*=\s*)?(-?\d*\.?\d+)\s*\)$"#
    ))
});
static COLUMN_STAT_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r#"^{T}\[\s*['"]([^'"]+)['"]\s*\]\.([a-z_]+)\(\s*\)$"#
    ))
});
static SELECT_ONE_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(&format!(r#"^{T}\[\s*['"]([^'"]+)['"]\s*\]$"#)));
static SELECT_MANY_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(&format!(r"^{T}\[\s*\[([^\]]*)\]\s*\]$")));
static FILTER_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(&format!(r"^{T}\[\s*({PRED})\s*\]{SEL}?$")));
static PREDICATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r#"^(?:[A-Za-z_]\w*\s*\[\s*['"]([^'"]+)['"]\s*\]|([A-Za-z_]\w*))\s*(>=|<=|==|!=|>|<)\s*('[^']*'|"[^"]*"|[^\[\]\s]+)$"#,
    )
});
static SERIES_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r#"^{T}(?:\[\s*({PRED})\s*\])?\[\s*['"]([^'"]+)['"]\s*\]$"#
    ))
});
static CALL_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^(?:[A-Za-z_]\w*\.)*([A-Za-z_]\w*)\(\s*(.*?)\s*\)$"));
static CROSSTAB_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^(?:[A-Za-z_]\w*\.)?crosstab\(\s*(.*?)\s*\)$"));
static QUOTED_RE: LazyLock<Regex> = LazyLock::new(|| compile(r#"['"]([^'"]+)['"]"#));
static PERIODS_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^(?:periods\s*=\s*)?(-?\d+)$"));
static MU_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"^(?:(?:popmean|mu)\s*=\s*)?(-?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?)$")
});

/// Function-call families and the shape each one expects
const SIGNATURES: &[(&str, &str)] = &[
    ("ttest_1samp", "ttest_1samp(df['col'], mu)"),
    ("ttest_ind", "ttest_ind(df['col'], df['col'])"),
    ("chi2_contingency", "chi2_contingency(df['a'], df['b'])"),
    ("normaltest", "normaltest(df['col'])"),
    ("shapiro", "shapiro(df['col'])"),
    ("pearsonr", "pearsonr(df['x'], df['y'])"),
    ("linregress", "linregress(df['x'], df['y'])"),
    ("ols", "ols(df['y'], df[['x1', 'x2']])"),
    ("trend_analysis", "trend_analysis(df['col'])"),
    ("forecast", "forecast(df['col'], periods=N)"),
];

/// Method-chain families: detection pattern, operation name, expected shape
static METHOD_FAMILIES: LazyLock<Vec<(Regex, &'static str, &'static str)>> =
    LazyLock::new(|| {
        vec![
            (compile(r"\.head\b"), "head", "df.head(n)"),
            (compile(r"\.tail\b"), "tail", "df.tail(n)"),
            (compile(r"\.describe\b"), "describe", "df.describe()"),
            (compile(r"\.value_counts\b"), "value_counts", "df['col'].value_counts()"),
            (compile(r"\.groupby\b"), "groupby", "df.groupby('key').sum()"),
            (compile(r"\.sort_values\b"), "sort_values", "df.sort_values('col', ascending=True)"),
            (compile(r"\.corr\b"), "corr", "df[['a', 'b']].corr()"),
            (compile(r"\.cov\b"), "cov", "df[['a', 'b']].cov()"),
            (compile(r"\.quantile\b"), "quantile", "df['col'].quantile(q)"),
        ]
    });

/// A failed parse and the columns the expression names
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Rejected {
    pub columns: Vec<String>,
    pub error: QueryError,
}

impl Rejected {
    fn domain<S: AsRef<str>>(columns: &[S], message: String) -> Self {
        Self {
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            error: QueryError::DomainError(message),
        }
    }
}

impl From<QueryError> for Rejected {
    fn from(error: QueryError) -> Self {
        Self {
            columns: Vec::new(),
            error,
        }
    }
}

pub(crate) type ParseResult<T> = Result<T, Rejected>;

type Matcher = fn(&str, &EngineOptions) -> ParseResult<Option<Command>>;

/// Matchers in priority order
const MATCHERS: &[(&str, Matcher)] = &[
    ("head/tail", parse_head),
    ("metadata", parse_metadata),
    ("describe", parse_describe),
    ("value_counts", parse_value_counts),
    ("groupby", parse_groupby),
    ("sort_values", parse_sort),
    ("corr/cov", parse_matrix),
    ("column statistic", parse_column_stat),
    ("selection", parse_selection),
    ("function call", parse_call),
];

/// Parse an expression.
///
/// `Ok(None)` means no shape matched and no known operation family was
/// called. A recognized family that fails to parse is `InvalidSyntax`.
pub(crate) fn parse(expression: &str, options: &EngineOptions) -> ParseResult<Option<Command>> {
    let expr = expression.trim().trim_end_matches(';').trim();

    for (name, matcher) in MATCHERS {
        if let Some(cmd) = matcher(expr, options)? {
            trace!("expression matched {} shape", name);
            return Ok(Some(cmd));
        }
    }

    if let Some(&(_, operation, expected)) =
        METHOD_FAMILIES.iter().find(|(re, _, _)| re.is_match(expr))
    {
        return Err(QueryError::InvalidSyntax {
            operation,
            expected,
        }
        .into());
    }
    if let Some(&(operation, expected)) = SIGNATURES.iter().find(|(name, _)| calls(expr, name)) {
        return Err(QueryError::InvalidSyntax {
            operation,
            expected,
        }
        .into());
    }

    Ok(None)
}

/// `name` as a whole word followed by an opening parenthesis
fn calls(expr: &str, name: &str) -> bool {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    expr.match_indices(name).any(|(i, _)| {
        let before = expr[..i].chars().next_back();
        !before.is_some_and(is_word) && expr[i + name.len()..].trim_start().starts_with('(')
    })
}

fn parse_head(expr: &str, options: &EngineOptions) -> ParseResult<Option<Command>> {
    let Some(caps) = HEAD_RE.captures(expr) else {
        return Ok(None);
    };
    let n = match &caps[2] {
        "" => options.default_head,
        digits => digits.parse::<usize>().map_err(|_| {
            QueryError::DomainError(format!(
                "row count must be at most {}, got {}",
                options.max_head, digits
            ))
        })?,
    };
    if n > options.max_head {
        return Err(QueryError::DomainError(format!(
            "row count must be at most {}, got {}",
            options.max_head, n
        ))
        .into());
    }
    Ok(Some(if &caps[1] == "head" {
        Command::Head(n)
    } else {
        Command::Tail(n)
    }))
}

fn parse_metadata(expr: &str, _: &EngineOptions) -> ParseResult<Option<Command>> {
    let cmd = if SHAPE_RE.is_match(expr) {
        Command::Shape
    } else if COLUMNS_RE.is_match(expr) {
        Command::Columns
    } else if DTYPES_RE.is_match(expr) {
        Command::Dtypes
    } else if INFO_RE.is_match(expr) {
        Command::Info
    } else if LEN_RE.is_match(expr) {
        Command::Len
    } else {
        return Ok(None);
    };
    Ok(Some(cmd))
}

fn parse_describe(expr: &str, _: &EngineOptions) -> ParseResult<Option<Command>> {
    Ok(DESCRIBE_RE.captures(expr).map(|caps| Command::Describe {
        columns: caps.get(1).map(|m| quoted_list(m.as_str())),
    }))
}

fn parse_value_counts(expr: &str, _: &EngineOptions) -> ParseResult<Option<Command>> {
    Ok(VALUE_COUNTS_RE
        .captures(expr)
        .map(|caps| Command::ValueCounts {
            column: caps[1].to_string(),
        }))
}

fn parse_groupby(expr: &str, _: &EngineOptions) -> ParseResult<Option<Command>> {
    let Some(caps) = GROUPBY_RE.captures(expr) else {
        return Ok(None);
    };

    let keys = quoted_list(&caps[1]);
    let target = caps.get(2).map(|m| m.as_str().to_string());
    let named: Vec<&String> = keys.iter().chain(&target).collect();
    if keys.is_empty() {
        return Err(Rejected::domain(
            &named,
            "groupby requires at least one key column".into(),
        ));
    }

    // a bare `.agg()` sums
    let agg_name = caps
        .get(3)
        .or_else(|| caps.get(4))
        .map_or("sum", |m| m.as_str());
    let Some(agg) = Aggregation::parse(agg_name) else {
        return Err(Rejected::domain(
            &named,
            format!(
                "aggregation must be one of {}, got '{}'",
                Aggregation::NAMES,
                agg_name
            ),
        ));
    };

    Ok(Some(Command::GroupBy { keys, target, agg }))
}

fn parse_sort(expr: &str, _: &EngineOptions) -> ParseResult<Option<Command>> {
    Ok(SORT_RE.captures(expr).map(|caps| Command::SortValues {
        column: caps[1].to_string(),
        ascending: caps
            .get(2)
            .map_or(true, |m| m.as_str().eq_ignore_ascii_case("true")),
    }))
}

fn matrix_kind(name: &str) -> MatrixKind {
    if name == "corr" {
        MatrixKind::Correlation
    } else {
        MatrixKind::Covariance
    }
}

fn parse_matrix(expr: &str, _: &EngineOptions) -> ParseResult<Option<Command>> {
    if let Some(caps) = MATRIX_RE.captures(expr) {
        return Ok(Some(Command::Matrix {
            kind: matrix_kind(&caps[2]),
            columns: caps.get(1).map(|m| quoted_list(m.as_str())),
        }));
    }
    Ok(PAIR_RE.captures(expr).map(|caps| Command::PairStat {
        kind: matrix_kind(&caps[2]),
        x: caps[1].to_string(),
        y: caps[3].to_string(),
    }))
}

fn parse_column_stat(expr: &str, _: &EngineOptions) -> ParseResult<Option<Command>> {
    if let Some(caps) = QUANTILE_RE.captures(expr) {
        let q: f64 = caps[2].parse().map_err(|_| QueryError::InvalidSyntax {
            operation: "quantile",
            expected: "df['col'].quantile(q)",
        })?;
        if !(0.0..=1.0).contains(&q) {
            return Err(Rejected::domain(
                &[&caps[1]],
                format!("quantile must be between 0 and 1, got {}", q),
            ));
        }
        return Ok(Some(Command::ColumnStat {
            column: caps[1].to_string(),
            stat: ColumnStat::Quantile(q),
        }));
    }

    Ok(COLUMN_STAT_RE.captures(expr).and_then(|caps| {
        ColumnStat::parse(&caps[2]).map(|stat| Command::ColumnStat {
            column: caps[1].to_string(),
            stat,
        })
    }))
}

fn parse_selection(expr: &str, _: &EngineOptions) -> ParseResult<Option<Command>> {
    if let Some(caps) = SELECT_ONE_RE.captures(expr) {
        return Ok(Some(Command::Select {
            columns: vec![caps[1].to_string()],
        }));
    }
    if let Some(caps) = SELECT_MANY_RE.captures(expr) {
        return Ok(Some(Command::Select {
            columns: quoted_list(&caps[1]),
        }));
    }
    if let Some(caps) = FILTER_RE.captures(expr) {
        let predicate = parse_predicate(&caps[1]).ok_or(QueryError::InvalidSyntax {
            operation: "filter",
            expected: "df[df['col'] > value]",
        })?;
        return Ok(Some(Command::Filter {
            predicate,
            projection: caps.get(2).map(|m| quoted_list(m.as_str())),
        }));
    }
    Ok(None)
}

fn parse_call(expr: &str, options: &EngineOptions) -> ParseResult<Option<Command>> {
    let Some(caps) = CALL_RE.captures(expr) else {
        return Ok(None);
    };
    let name = caps.get(1).map_or("", |m| m.as_str());
    let Some(&(operation, expected)) = SIGNATURES.iter().find(|(n, _)| *n == name) else {
        return Ok(None);
    };
    let invalid = Rejected::from(QueryError::InvalidSyntax {
        operation,
        expected,
    });

    let args = split_args(caps.get(2).map_or("", |m| m.as_str()));
    let series = |i: usize| args.get(i).and_then(|a| parse_series(a));

    let cmd = match (operation, args.len()) {
        ("ttest_1samp", 2) => {
            let mu = MU_RE
                .captures(args[1])
                .and_then(|c| c[1].parse::<f64>().ok());
            match (series(0), mu) {
                (Some(series), Some(mu)) => Command::OneSampleTTest { series, mu },
                _ => return Err(invalid),
            }
        }
        ("ttest_ind", 2) => match (series(0), series(1)) {
            (Some(a), Some(b)) => Command::TwoSampleTTest { a, b },
            _ => return Err(invalid),
        },
        ("chi2_contingency", 1) => {
            let inner = CROSSTAB_RE.captures(args[0]).ok_or(invalid.clone())?;
            let inner_args = split_args(inner.get(1).map_or("", |m| m.as_str()));
            match inner_args.as_slice() {
                [a, b] => match (parse_series(a), parse_series(b)) {
                    (Some(rows), Some(cols)) => Command::ChiSquare { rows, cols },
                    _ => return Err(invalid),
                },
                _ => return Err(invalid),
            }
        }
        ("chi2_contingency", 2) => match (series(0), series(1)) {
            (Some(rows), Some(cols)) => Command::ChiSquare { rows, cols },
            _ => return Err(invalid),
        },
        ("normaltest" | "shapiro", 1) => match series(0) {
            Some(series) => Command::Normality { series },
            None => return Err(invalid),
        },
        ("pearsonr", 2) => match (series(0), series(1)) {
            (Some(x), Some(y)) => Command::PearsonTest { x, y },
            _ => return Err(invalid),
        },
        ("linregress", 2) => match (series(0), series(1)) {
            (Some(x), Some(y)) => Command::LinRegress { x, y },
            _ => return Err(invalid),
        },
        ("ols", 2) => {
            let predictors = SELECT_MANY_RE
                .captures(args[1])
                .map(|c| quoted_list(&c[1]))
                .or_else(|| series(1).filter(|s| s.filter.is_none()).map(|s| vec![s.column]));
            match (series(0), predictors) {
                (Some(y), Some(x)) if !x.is_empty() => Command::MultipleRegression { y, x },
                _ => return Err(invalid),
            }
        }
        ("trend_analysis", 1) => match series(0) {
            Some(series) => Command::Trend { series },
            None => return Err(invalid),
        },
        ("forecast", 2) => {
            let periods = PERIODS_RE
                .captures(args[1])
                .and_then(|c| c[1].parse::<i64>().ok());
            match (series(0), periods) {
                (Some(series), Some(periods)) => {
                    let cmd = Command::Forecast { series, periods };
                    let max = MAX_FORECAST_PERIODS.min(options.max_forecast_periods as i64);
                    if !(1..=max).contains(&periods) {
                        return Err(Rejected::domain(
                            &cmd.referenced_columns(),
                            format!(
                                "forecast periods must be between 1 and {}, got {}",
                                max, periods
                            ),
                        ));
                    }
                    cmd
                }
                _ => return Err(invalid),
            }
        }
        _ => return Err(invalid),
    };

    Ok(Some(cmd))
}

/// `df['col']`, `df[df['g'] == 'A']['col']` or `df[g == 'A']['col']`
fn parse_series(arg: &str) -> Option<SeriesRef> {
    let caps = SERIES_RE.captures(arg.trim())?;
    let filter = match caps.get(1) {
        Some(m) => Some(parse_predicate(m.as_str())?),
        None => None,
    };
    Some(SeriesRef {
        column: caps[2].to_string(),
        filter,
    })
}

fn parse_predicate(text: &str) -> Option<Predicate> {
    let caps = PREDICATE_RE.captures(text.trim())?;
    let column = caps.get(1).or_else(|| caps.get(2))?.as_str().to_string();
    Some(Predicate {
        column,
        op: CompareOp::parse(&caps[3])?,
        value: parse_literal(&caps[4]),
    })
}

/// Quoted text, numbers, `True`/`False` and `None`; any other bare word is text
fn parse_literal(text: &str) -> Value {
    let t = text.trim();
    if t.len() >= 2
        && ((t.starts_with('\'') && t.ends_with('\'')) || (t.starts_with('"') && t.ends_with('"')))
    {
        return Value::Text(t[1..t.len() - 1].to_string());
    }
    match t {
        "True" | "true" => Value::Bool(true),
        "False" | "false" => Value::Bool(false),
        "None" | "null" | "NaN" | "nan" => Value::Null,
        _ => t
            .parse::<f64>()
            .map(Value::Number)
            .unwrap_or_else(|_| Value::Text(t.to_string())),
    }
}

/// Every quoted name in a list such as `['a', "b"]`
fn quoted_list(text: &str) -> Vec<String> {
    QUOTED_RE
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .collect()
}

/// Split call arguments on top-level commas, respecting brackets and quotes
fn split_args(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '\'' | '"' => quote = Some(c),
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth -= 1,
                ',' if depth == 0 => {
                    out.push(text[start..i].trim());
                    start = i + 1;
                }
                _ => {}
            },
        }
    }
    let last = text[start..].trim();
    if !last.is_empty() || !out.is_empty() {
        out.push(last);
    }
    out
}
