//! Construtor de filtros PostgREST
//!
//! Cada filtro vira um par `coluna=operador.valor` na query string. Filtros agrupados
//! com [`Query::or`] viram `or=(a.op.v,b.op.v)`.

use std::fmt;

/// Um predicado PostgREST sobre uma coluna
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `coluna=eq.valor`
    Eq(String, String),
    /// `coluna=lt.valor`
    Lt(String, String),
    /// `coluna=is.null`
    IsNull(String),
    /// `coluna=eq.[]` (array/jsonb vazio)
    IsEmptyArray(String),
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Eq(column.into(), value.into())
    }

    pub fn lt(column: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Lt(column.into(), value.into())
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Filter::IsNull(column.into())
    }

    pub fn is_empty_array(column: impl Into<String>) -> Self {
        Filter::IsEmptyArray(column.into())
    }

    pub fn column(&self) -> &str {
        match self {
            Filter::Eq(c, _) | Filter::Lt(c, _) | Filter::IsNull(c) | Filter::IsEmptyArray(c) => c,
        }
    }

    /// Parte `operador.valor` do filtro
    fn operand(&self) -> String {
        match self {
            Filter::Eq(_, v) => format!("eq.{}", v),
            Filter::Lt(_, v) => format!("lt.{}", v),
            Filter::IsNull(_) => "is.null".to_string(),
            Filter::IsEmptyArray(_) => "eq.[]".to_string(),
        }
    }

    /// Forma usada dentro de `or=(...)`: valores com vírgula, parênteses ou aspas
    /// precisam ir entre aspas duplas.
    fn nested(&self) -> String {
        let operand = match self {
            Filter::Eq(_, v) => format!("eq.{}", quote_reserved(v)),
            Filter::Lt(_, v) => format!("lt.{}", quote_reserved(v)),
            other => other.operand(),
        };
        format!("{}.{}", self.column(), operand)
    }
}

fn quote_reserved(value: &str) -> String {
    if value.contains(&[',', '(', ')', '"'][..]) {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{}\"", escaped)
    } else {
        value.to_string()
    }
}

/// Query PostgREST: projeção + filtros + limite
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    select: Option<String>,
    filters: Vec<Filter>,
    any_of: Vec<Vec<Filter>>,
    limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Projeção de colunas. Espaços são removidos (`"id, name"` → `id,name`).
    pub fn select(mut self, columns: &str) -> Self {
        let cleaned: String = columns.chars().filter(|c| !c.is_whitespace()).collect();
        self.select = Some(cleaned);
        self
    }

    pub fn eq(mut self, column: &str, value: impl Into<String>) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    pub fn lt(mut self, column: &str, value: impl Into<String>) -> Self {
        self.filters.push(Filter::lt(column, value));
        self
    }

    pub fn is_null(mut self, column: &str) -> Self {
        self.filters.push(Filter::is_null(column));
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Grupo OR: pelo menos um dos filtros precisa casar
    pub fn or(mut self, filters: &[Filter]) -> Self {
        if !filters.is_empty() {
            self.any_of.push(filters.to_vec());
        }
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Pares (chave, valor) ainda não codificados
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();

        if let Some(select) = &self.select {
            pairs.push(("select".to_string(), select.clone()));
        }

        for filter in &self.filters {
            pairs.push((filter.column().to_string(), filter.operand()));
        }

        for group in &self.any_of {
            let inner: Vec<String> = group.iter().map(Filter::nested).collect();
            pairs.push(("or".to_string(), format!("({})", inner.join(","))));
        }

        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }

        pairs
    }
}

impl fmt::Display for Query {
    /// Query string codificada (sem o `?` inicial)
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded: Vec<String> = self
            .to_query_pairs()
            .into_iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(&k), urlencoding::encode(&v)))
            .collect();
        write!(f, "{}", encoded.join("&"))
    }
}
