//! Code Emitter: one C wrapper source file per function.
//!
//! Output depends only on the descriptor, its strategy, the active mapping
//! table and the run config, so identical inputs give identical bytes.

use std::collections::BTreeMap;

use crate::config::Config;
use crate::error::EmissionError;
use crate::model::{Descriptor, Direction, MappingTable, Parameter};
use crate::processor::resolver::{Strategy, is_pointer, resolve_parameter};
use crate::writer::builder::CodeBuilder;

/// Error identifier -> message, sorted by identifier.
pub type ErrorIds = BTreeMap<String, String>;

/// Text of one generated file plus the error identifiers it references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emitted {
    pub lines: Vec<String>,
    pub error_ids: ErrorIds,
}

const GLOBAL_CS: &str = "GLOBAL, MPIR_THREAD_GLOBAL_ALLFUNC_MUTEX";
const ERR_CREATE: &str = "MPIR_Err_create_code(";

pub fn emit(
    descriptor: &Descriptor,
    strategy: Strategy,
    table: &MappingTable,
    config: &Config,
) -> Result<Emitted, EmissionError> {
    let params = typed_parameters(descriptor, table)?;
    let name = descriptor.name.as_str();
    let pname = config.profiling_name(name);
    let proto = prototype(name, &params);

    let mut error_ids = ErrorIds::new();
    let mut out = CodeBuilder::new();

    // ---------------------------------------------------------------
    // 1. Banner & profiling symbol block
    // ---------------------------------------------------------------
    out.raw("/*");
    out.raw(format!(" * Generated by capigen from {name}. DO NOT EDIT."));
    out.raw(" */");
    out.blank();
    out.raw("#include \"mpiimpl.h\"");
    out.blank();
    out.raw(format!("/* -- Begin Profiling Symbol Block for routine {name} */"));
    out.raw("#if defined(HAVE_PRAGMA_WEAK)");
    out.raw(format!("#pragma weak {name} = {pname}"));
    out.raw("#elif defined(HAVE_WEAK_ATTRIBUTE)");
    out.raw(format!("{proto} __attribute__ ((weak, alias(\"{pname}\")));"));
    out.raw("#endif");
    out.raw("/* -- End Profiling Symbol Block */");
    out.blank();
    out.raw("/* Define MPICH_MPI_FROM_PMPI if weak symbols are not supported to build");
    out.raw("   the MPI routines */");
    out.raw("#ifndef MPICH_MPI_FROM_PMPI");
    out.raw(format!("#undef {name}"));
    out.raw(format!("#define {name} {pname}"));
    out.raw("#endif");
    out.blank();

    // ---------------------------------------------------------------
    // 2. Doc block
    // ---------------------------------------------------------------
    doc_block(&mut out, descriptor);

    // ---------------------------------------------------------------
    // 3. Definition
    // ---------------------------------------------------------------
    let call = format!(
        "{}({})",
        config.impl_name(name),
        params.iter().map(|(p, _)| p.name.as_str()).collect::<Vec<_>>().join(", ")
    );

    out.raw(proto);
    match strategy {
        Strategy::Query => out.block("{", |out| {
            out.line("int mpi_errno;");
            out.blank();
            out.line("MPIR_FUNC_TERSE_ENTER;");
            out.line(format!("mpi_errno = {call};"));
            out.line("MPIR_FUNC_TERSE_EXIT;");
            out.blank();
            out.line("return mpi_errno;");
        }),
        Strategy::Wrapper | Strategy::Local => {
            let locked = strategy == Strategy::Wrapper;
            let fail_args = error_code_args(descriptor, &params, &mut error_ids)?;
            out.block("{", |out| {
                out.line("int mpi_errno = MPI_SUCCESS;");
                out.blank();
                out.line("MPIR_FUNC_TERSE_ENTER;");
                if locked {
                    out.line(format!("MPID_THREAD_CS_ENTER({GLOBAL_CS});"));
                }
                out.blank();
                error_checks(out, &params);
                out.line(format!("mpi_errno = {call};"));
                out.block("if (mpi_errno) {", |out| {
                    out.line("goto fn_fail;");
                });
                out.blank();
                out.raw("  fn_exit:");
                if locked {
                    out.line(format!("MPID_THREAD_CS_EXIT({GLOBAL_CS});"));
                }
                out.line("MPIR_FUNC_TERSE_EXIT;");
                out.line("return mpi_errno;");
                out.blank();
                out.raw("  fn_fail:");
                out.line("/* --BEGIN ERROR HANDLING-- */");
                out.raw("#ifdef HAVE_ERROR_CHECKING");
                out.line("mpi_errno =");
                out.indent();
                out.line(format!(
                    "{ERR_CREATE}mpi_errno, MPIR_ERR_RECOVERABLE, __func__, __LINE__, MPI_ERR_OTHER,"
                ));
                out.line(format!("{}{fail_args});", " ".repeat(ERR_CREATE.len())));
                out.dedent();
                out.raw("#endif");
                out.line("mpi_errno = MPIR_Err_return_comm(0, __func__, mpi_errno);");
                out.line("/* --END ERROR HANDLING-- */");
                out.line("goto fn_exit;");
            })
        }
    };

    Ok(Emitted {
        lines: out.finish(),
        error_ids,
    })
}

/// `int MPIR_Send_impl(const void *buf, int count);`
pub fn impl_declaration(
    descriptor: &Descriptor,
    table: &MappingTable,
    config: &Config,
) -> Result<String, EmissionError> {
    let params = typed_parameters(descriptor, table)?;
    Ok(format!(
        "{};",
        prototype(&config.impl_name(&descriptor.name), &params)
    ))
}

fn typed_parameters<'a>(
    descriptor: &'a Descriptor,
    table: &MappingTable,
) -> Result<Vec<(&'a Parameter, String)>, EmissionError> {
    descriptor
        .signature
        .parameters
        .iter()
        .map(|p| Ok((p, resolve_parameter(descriptor, p, table)?)))
        .collect()
}

fn prototype(symbol: &str, params: &[(&Parameter, String)]) -> String {
    let args = if params.is_empty() {
        "void".to_string()
    } else {
        params
            .iter()
            .map(|(p, ty)| {
                if is_pointer(ty) {
                    format!("{}{}", ty.trim_end(), p.name)
                } else {
                    format!("{ty} {}", p.name)
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!("int {symbol}({args})")
}

fn doc_block(out: &mut CodeBuilder, descriptor: &Descriptor) {
    out.raw("/*@");
    match &descriptor.signature.desc {
        Some(desc) => out.raw(format!("   {} - {desc}", descriptor.name)),
        None => out.raw(format!("   {}", descriptor.name)),
    };

    let sections = [
        ("Input Parameters:", Direction::In),
        ("Input/Output Parameters:", Direction::InOut),
        ("Output Parameters:", Direction::Out),
    ];
    for (title, direction) in sections {
        let group: Vec<_> = descriptor
            .signature
            .parameters
            .iter()
            .filter(|p| p.direction == direction)
            .collect();
        if group.is_empty() {
            continue;
        }
        out.blank();
        out.raw(title);
        for (i, p) in group.iter().enumerate() {
            // doctext list markers: '+' first, '-' last, '.' otherwise
            let marker = match (i, group.len()) {
                (_, 1) => '.',
                (0, _) => '+',
                (i, n) if i == n - 1 => '-',
                _ => '.',
            };
            let desc = p.desc.as_deref().unwrap_or(p.kind.as_str());
            out.raw(format!("{marker} {} - {desc}", p.name));
        }
    }

    out.blank();
    out.raw(".N Errors");
    out.raw("@*/");
}

fn error_checks(out: &mut CodeBuilder, params: &[(&Parameter, String)]) {
    let checked: Vec<_> = params
        .iter()
        .filter(|(p, _)| p.direction != Direction::In && !p.optional)
        .collect();
    if checked.is_empty() {
        return;
    }

    out.raw("#ifdef HAVE_ERROR_CHECKING");
    out.block("{", |out| {
        out.line("MPID_BEGIN_ERROR_CHECKS;");
        out.block("{", |out| {
            for (p, _) in &checked {
                out.line(format!(
                    "MPIR_ERRTEST_ARGNULL({n}, \"{n}\", mpi_errno);",
                    n = p.name
                ));
            }
        });
        out.line("MPID_END_ERROR_CHECKS;");
    });
    out.raw("#endif /* HAVE_ERROR_CHECKING */");
    out.blank();
}

/// Registers the function's error identifiers and returns the tail of the
/// `MPIR_Err_create_code` call.
fn error_code_args(
    descriptor: &Descriptor,
    params: &[(&Parameter, String)],
    error_ids: &mut ErrorIds,
) -> Result<String, EmissionError> {
    let name = &descriptor.name;
    let short_id = format!("**{}", name.to_lowercase());
    error_ids.insert(short_id.clone(), format!("{name} failed"));

    if params.is_empty() {
        return Ok(format!("\"{short_id}\", 0"));
    }

    let mut specs = Vec::with_capacity(params.len());
    let mut fields = Vec::with_capacity(params.len());
    for (p, ty) in params {
        let spec = format_spec(ty).ok_or_else(|| EmissionError::NoFormatSpec {
            function: name.clone(),
            parameter: p.name.clone(),
            ty: ty.clone(),
        })?;
        specs.push(spec);
        fields.push(format!("{}={spec}", p.name));
    }

    let long_id = format!("{short_id} {}", specs.join(" "));
    error_ids.insert(long_id.clone(), format!("{name}({}) failed", fields.join(", ")));

    let names: Vec<_> = params.iter().map(|(p, _)| p.name.as_str()).collect();
    Ok(format!(
        "\"{short_id}\", \"{long_id}\", {}",
        names.join(", ")
    ))
}

/// Conversion used by the runtime's error-string formatter for a C type.
fn format_spec(ty: &str) -> Option<&'static str> {
    if is_pointer(ty) {
        return Some("%p");
    }
    let base = ty.trim().trim_start_matches("const ").trim();
    let spec = match base {
        "int" | "MPI_Fint" => "%d",
        "MPI_Aint" | "MPI_Offset" => "%L",
        "MPI_Count" => "%c",
        "double" => "%f",
        "MPI_Datatype" => "%D",
        "MPI_Comm" => "%C",
        "MPI_Op" => "%O",
        "MPI_Info" => "%I",
        "MPI_Request" => "%R",
        "MPI_Win" => "%W",
        "MPI_Group" => "%G",
        "MPI_File" => "%F",
        "MPI_Errhandler" => "%E",
        "MPI_Message" => "%M",
        _ => return None,
    };
    Some(spec)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> MappingTable {
        let mut table = MappingTable::new("SMALL_C_KIND_MAP");
        for (k, v) in [
            ("BUFFER", "void *"),
            ("COUNT", "int"),
            ("COMMUNICATOR", "MPI_Comm"),
            ("REQUEST", "MPI_Request"),
            ("STATUS", "MPI_Status"),
            ("WEIRD", "struct weird"),
        ] {
            table.rules.insert(k.into(), v.into());
        }
        table
    }

    fn send() -> Descriptor {
        let mut d = Descriptor::new("MPI_Send", "pt2pt");
        d.signature.desc = Some("Performs a blocking send".into());
        let mut buf = Parameter::new("buf", "BUFFER");
        buf.constant = true;
        buf.desc = Some("initial address of send buffer".into());
        d.signature.parameters = vec![
            buf,
            Parameter::new("count", "COUNT"),
            Parameter::new("comm", "COMMUNICATOR"),
        ];
        d
    }

    #[test]
    fn test_emit_wrapper() {
        let emitted = emit(&send(), Strategy::Wrapper, &table(), &Config::default()).unwrap();
        let text = emitted.lines.join("\n");

        assert!(text.contains("#pragma weak MPI_Send = PMPI_Send"));
        assert!(text.contains("#define MPI_Send PMPI_Send"));
        assert!(text.contains("\nint MPI_Send(const void *buf, int count, MPI_Comm comm)\n{\n"));
        assert!(text.contains("   MPI_Send - Performs a blocking send"));
        assert!(text.contains("+ buf - initial address of send buffer\n. count - COUNT\n- comm - COMMUNICATOR"));
        assert!(text.contains("    MPID_THREAD_CS_ENTER(GLOBAL, MPIR_THREAD_GLOBAL_ALLFUNC_MUTEX);"));
        assert!(text.contains("    mpi_errno = MPIR_Send_impl(buf, count, comm);"));
        assert!(text.contains("\"**mpi_send\", \"**mpi_send %p %d %C\", buf, count, comm);"));
        assert!(!text.contains("MPIR_ERRTEST_ARGNULL"), "no out-parameters to check");

        let ids: Vec<_> = emitted.error_ids.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(
            ids,
            vec![
                ("**mpi_send", "MPI_Send failed"),
                ("**mpi_send %p %d %C", "MPI_Send(buf=%p, count=%d, comm=%C) failed"),
            ]
        );
    }

    #[test]
    fn test_emit_local_checks_out_parameters() {
        let mut d = Descriptor::new("MPI_Irecv", "pt2pt");
        let mut request = Parameter::new("request", "REQUEST");
        request.direction = Direction::Out;
        let mut status = Parameter::new("status", "STATUS");
        status.direction = Direction::InOut;
        status.optional = true;
        d.signature.parameters = vec![Parameter::new("count", "COUNT"), request, status];

        let emitted = emit(&d, Strategy::Local, &table(), &Config::default()).unwrap();
        let text = emitted.lines.join("\n");

        assert!(text.contains("int MPI_Irecv(int count, MPI_Request *request, MPI_Status *status)"));
        assert!(!text.contains("MPID_THREAD_CS_ENTER"));
        assert!(text.contains(
            "            MPIR_ERRTEST_ARGNULL(request, \"request\", mpi_errno);"
        ));
        assert!(!text.contains("MPIR_ERRTEST_ARGNULL(status"), "optional out-parameter");
        assert!(text.contains("Input/Output Parameters:\n. status - STATUS"));
        assert!(emitted.error_ids.contains_key("**mpi_irecv %d %p %p"));
    }

    #[test]
    fn test_emit_query_has_no_error_ids() {
        let mut d = Descriptor::new("MPI_Comm_weird", "topo");
        d.signature.parameters = vec![Parameter::new("w", "WEIRD")];

        let emitted = emit(&d, Strategy::Query, &table(), &Config::default()).unwrap();
        assert!(emitted.error_ids.is_empty());
        assert!(emitted
            .lines
            .contains(&"    mpi_errno = MPIR_Comm_weird_impl(w);".to_string()));
    }

    #[test]
    fn test_emit_without_parameters() {
        let d = Descriptor::new("MPI_Finalize", "init");
        let emitted = emit(&d, Strategy::Wrapper, &table(), &Config::default()).unwrap();
        let text = emitted.lines.join("\n");

        assert!(text.contains("int MPI_Finalize(void)"));
        assert!(text.contains("\"**mpi_finalize\", 0);"));
        assert_eq!(emitted.error_ids.len(), 1);
    }

    #[test]
    fn test_emit_failures() {
        let mut d = Descriptor::new("MPI_Comm_weird", "pt2pt");
        d.signature.parameters = vec![Parameter::new("w", "WEIRD")];
        let err = emit(&d, Strategy::Wrapper, &table(), &Config::default()).unwrap_err();
        assert_eq!(
            err,
            EmissionError::NoFormatSpec {
                function: "MPI_Comm_weird".into(),
                parameter: "w".into(),
                ty: "struct weird".into(),
            }
        );

        d.signature.parameters = vec![Parameter::new("x", "NOPE")];
        let err = emit(&d, Strategy::Query, &table(), &Config::default()).unwrap_err();
        assert!(matches!(err, EmissionError::UnmappedParameterKind { .. }));
    }

    #[test]
    fn test_emit_is_deterministic() {
        let a = emit(&send(), Strategy::Wrapper, &table(), &Config::default()).unwrap();
        let b = emit(&send(), Strategy::Wrapper, &table(), &Config::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_impl_declaration() {
        let decl = impl_declaration(&send(), &table(), &Config::default()).unwrap();
        assert_eq!(decl, "int MPIR_Send_impl(const void *buf, int count, MPI_Comm comm);");
    }
}
