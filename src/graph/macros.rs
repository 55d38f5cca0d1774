//! Macro for inline Cypher statements.

/// Creates a [`Query`](crate::graph::Query) with inline named parameters.
///
/// The first argument is a reference to any [`CypherExecutor`](crate::graph::CypherExecutor).
///
/// ```ignore
/// use neoquent::cypher;
///
/// let rows = cypher!(&client, "MATCH (n) WHERE id(n) = $id RETURN n", id = 42)
///     .fetch_all()
///     .await?;
/// ```
#[macro_export]
macro_rules! cypher {
    ($executor:expr, $query:expr) => {
        $crate::graph::Query::new($executor, $query)
    };
    ($executor:expr, $query:expr, $($name:ident = $value:expr),+ $(,)?) => {
        $crate::graph::Query::new($executor, $query)$(.param(stringify!($name), $value))+
    };
}
