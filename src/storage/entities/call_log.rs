use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Function call audit record
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "function_calls")]
pub struct Model {
    /// Record id
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Correlation id of the originating chat request
    pub correlation_id: String,

    /// Function name
    pub function_name: String,

    /// Arguments (JSON)
    pub arguments_json: String,

    /// Result payload (JSON), absent for rejected calls
    pub result_json: Option<String>,

    /// Failure kind, when the call did not succeed
    pub error_kind: Option<String>,

    /// Dispatch start timestamp
    pub started_at: DateTimeUtc,

    /// Dispatch end timestamp
    pub finished_at: DateTimeUtc,
}

/// Entity relations (none)
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
