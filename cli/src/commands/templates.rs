use codelib_core::api::{CliError, Workbench, WorkbenchError};

use super::chunks::select;
use super::cli::{
    OutputFormat, TemplateApplyArgs, TemplateCommands, TemplateCreateArgs, TemplateListArgs,
    TemplateShowArgs,
};
use super::output;
use crate::utils::parse_params;

pub async fn run(
    wb: &mut Workbench,
    cmd: TemplateCommands,
    format: OutputFormat,
) -> Result<i32, CliError> {
    match cmd {
        TemplateCommands::List(args) => list(wb, args, format).await,
        TemplateCommands::Show(args) => show(wb, args, format).await,
        TemplateCommands::Create(args) => create(wb, args, format).await,
        TemplateCommands::Apply(args) => apply(wb, args, format).await,
    }
}

async fn list(wb: &mut Workbench, args: TemplateListArgs, format: OutputFormat) -> Result<i32, CliError> {
    let templates = wb.list_templates(args.skip, args.limit).await?;
    output::emit(format, &templates, output::template_list(&templates))?;
    Ok(0)
}

async fn show(wb: &mut Workbench, args: TemplateShowArgs, format: OutputFormat) -> Result<i32, CliError> {
    let loaded = wb.load_template(args.template_id).await?;
    output::emit(format, &loaded, output::template_detail(&loaded))?;
    Ok(0)
}

async fn create(
    wb: &mut Workbench,
    args: TemplateCreateArgs,
    format: OutputFormat,
) -> Result<i32, CliError> {
    select(wb, &args.chunk_ids).await?;
    let schema = wb.selection_schema();
    let created = wb.create_template(&args.name, args.description).await?;
    let mut text = format!("#{} {}", created.id, created.name);
    if !schema.is_empty() {
        text.push_str(&format!("\nparameters: {}", schema.names().join(", ")));
    }
    output::emit(format, &created, text)?;
    Ok(0)
}

async fn apply(
    wb: &mut Workbench,
    args: TemplateApplyArgs,
    format: OutputFormat,
) -> Result<i32, CliError> {
    let params = parse_params(&args.params)?;
    let mut loaded = wb.load_template(args.template_id).await?;
    for (name, value) in params {
        loaded.set(&name, value).map_err(WorkbenchError::from)?;
    }
    let applied = wb.apply_template(&loaded).await?;
    output::emit(format, &applied, output::applied_text(&applied))?;
    Ok(0)
}
