//! Record commands - query, find, describe and DML.

use anyhow::Result;
use clap::Args;
use forcelink_connector::OperationOptions;
use forcelink_types::FindOptions;

use super::{Context, parse_json, run_with_connector};

/// Arguments for the query command.
#[derive(Args, Debug)]
pub struct QueryArgs {
    /// SOQL statement
    pub soql: String,
}

/// Arguments for the find command.
#[derive(Args, Debug)]
pub struct FindArgs {
    /// Object to search, e.g. Account
    pub entity: String,

    /// Condition object as JSON, e.g. '{"Name": {"$like": "Acme%"}}'
    #[arg(long = "where", value_name = "JSON")]
    pub conditions: Option<String>,

    /// Fields to select
    #[arg(long, value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Maximum number of records
    #[arg(long)]
    pub limit: Option<u64>,

    /// Records to skip
    #[arg(long)]
    pub offset: Option<u64>,

    /// Sort expression, e.g. "-CreatedDate Name"
    #[arg(long)]
    pub sort: Option<String>,
}

/// Arguments for the describe command.
#[derive(Args, Debug)]
pub struct DescribeArgs {
    /// Object to describe
    pub object: String,
}

/// Arguments for create, update and delete.
#[derive(Args, Debug)]
pub struct RecordArgs {
    /// Object the records belong to
    pub entity: String,

    /// Record(s) or id(s) as JSON, or @file
    pub json: String,
}

/// Arguments for the upsert command.
#[derive(Args, Debug)]
pub struct UpsertArgs {
    /// Object the records belong to
    pub entity: String,

    /// Record(s) as JSON, or @file
    pub json: String,

    /// External id field to match on
    #[arg(long = "external-id", value_name = "FIELD")]
    pub external_id: String,
}

impl FindArgs {
    fn options(&self) -> Result<OperationOptions> {
        let mut options = OperationOptions::new()
            .with_entity(&self.entity)
            .with_find_options(FindOptions {
                limit: self.limit,
                offset: self.offset,
                sort: self.sort.clone(),
            });
        if !self.fields.is_empty() {
            options = options.with_fields(self.fields.clone());
        }
        if let Some(conditions) = &self.conditions {
            options = options.with_conditions(parse_json(conditions)?);
        }
        Ok(options)
    }
}

impl RecordArgs {
    fn options(&self) -> Result<OperationOptions> {
        Ok(OperationOptions::new()
            .with_entity(&self.entity)
            .with_details(parse_json(&self.json)?))
    }
}

pub async fn query(args: QueryArgs, ctx: &Context) -> Result<()> {
    let options = OperationOptions::new().with_soql(args.soql);
    run_with_connector(ctx, |c| async move { c.query(&options).await }).await
}

pub async fn find(args: FindArgs, ctx: &Context) -> Result<()> {
    let options = args.options()?;
    run_with_connector(ctx, |c| async move { c.query(&options).await }).await
}

pub async fn describe(args: DescribeArgs, ctx: &Context) -> Result<()> {
    let options = OperationOptions::new().with_object_class(args.object);
    run_with_connector(ctx, |c| async move { c.describe(&options).await }).await
}

pub async fn describe_global(ctx: &Context) -> Result<()> {
    let options = OperationOptions::new();
    run_with_connector(ctx, |c| async move { c.describe_global(&options).await }).await
}

pub async fn create(args: RecordArgs, ctx: &Context) -> Result<()> {
    let options = args.options()?;
    run_with_connector(ctx, |c| async move { c.create(&options).await }).await
}

pub async fn update(args: RecordArgs, ctx: &Context) -> Result<()> {
    let options = args.options()?;
    run_with_connector(ctx, |c| async move { c.update(&options).await }).await
}

pub async fn upsert(args: UpsertArgs, ctx: &Context) -> Result<()> {
    let options = OperationOptions::new()
        .with_entity(&args.entity)
        .with_details(parse_json(&args.json)?)
        .with_external_id_name(args.external_id);
    run_with_connector(ctx, |c| async move { c.upsert(&options).await }).await
}

pub async fn delete(args: RecordArgs, ctx: &Context) -> Result<()> {
    let options = args.options()?;
    run_with_connector(ctx, |c| async move { c.delete(&options).await }).await
}
