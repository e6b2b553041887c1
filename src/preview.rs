use anyhow::{Context, Result};
use log::info;

use crate::{cli::PreviewArgs, processor::CastPolicy, table};

pub fn execute(args: &PreviewArgs) -> Result<()> {
    let mut rowset = crate::open_prepared_table(&args.input)?;
    let policy = if args.lenient {
        CastPolicy::NullOnError
    } else {
        CastPolicy::Strict
    };
    rowset.apply_types(policy);

    let headers = rowset.column_headers().map(<[String]>::to_vec).unwrap_or_default();
    let types = rowset.types().map(<[_]>::to_vec);
    let mut rows = Vec::new();
    let mut cursor = rowset.iter()?;
    while rows.len() < args.rows {
        let Some(row) = cursor.next() else {
            break;
        };
        let row = row.with_context(|| {
            format!(
                "Reading row {} of {:?}",
                cursor.context().row_index + 1,
                args.input.input
            )
        })?;
        rows.push(row);
    }
    drop(cursor);

    print!("{}", table::render_rows(&headers, types.as_deref(), &rows));
    info!(
        "Displayed {} row(s) from {:?} ({} raw row(s) read)",
        rows.len(),
        args.input.input,
        rowset.rows_read()
    );
    Ok(())
}
