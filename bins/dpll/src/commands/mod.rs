//! Object dispatch for the dpll command.
//!
//! Every `device` and `pin` command follows the same path: the verb picks a
//! grammar, the remaining tokens are compiled into a request before any
//! socket is opened, and the replies are decoded and rendered.

pub mod device;
pub mod monitor;
pub mod pin;

use std::io::Write;

use anyhow::{Result, bail};
use dplink::netlink::genl::GenlMessage;
use dplink::netlink::genl::dpll::{
    DpllAttr, DpllConnection, DpllPinAttr, Object, Request, Verb, compile, decode,
};
use dplink::output::{
    OutputFormat, OutputOptions, Printable, PrintableList, RecordList, render, write_json,
};
use serde::Serialize;

const USAGE: &str = "\
Usage: dpll [ OPTIONS ] OBJECT { COMMAND | help }
       dpll [ -j[son] ] [ -p[retty] ]
where  OBJECT := { device | pin | monitor }
       OPTIONS := { -V[ersion] | -j[son] | -p[retty] }
";

/// Route the first token to its object handler.
pub async fn run(args: &[String], format: OutputFormat, opts: &OutputOptions) -> Result<()> {
    let Some((object, rest)) = args.split_first() else {
        eprint!("{USAGE}");
        return Ok(());
    };

    match object.as_str() {
        "help" => {
            eprint!("{USAGE}");
            Ok(())
        }
        "device" => device::run(rest, format, opts).await,
        "pin" => pin::run(rest, format, opts).await,
        "monitor" => monitor::run(rest, format, opts).await,
        other => bail!("Object \"{}\" not found", other),
    }
}

/// Run `show`, `set` or `id-get` on one object type.
///
/// `help` or an empty command line prints `usage` and succeeds.
pub(crate) async fn dispatch(
    object: Object,
    usage: &str,
    args: &[String],
    format: OutputFormat,
    opts: &OutputOptions,
) -> Result<()> {
    let Some((verb, tokens)) = args.split_first() else {
        eprint!("{usage}");
        return Ok(());
    };
    if verb == "help" {
        eprint!("{usage}");
        return Ok(());
    }
    let Some(verb) = Verb::parse(verb) else {
        bail!("Command \"{}\" not found", verb);
    };

    let request = compile(object, verb, tokens)?;
    tracing::debug!(
        object = object.name(),
        verb = verb.name(),
        dump = request.dump,
        len = request.attrs.len(),
        "compiled request"
    );
    let conn = DpllConnection::new().await?;
    let replies = conn.execute(&request).await?;

    let mut stdout = std::io::stdout().lock();
    match request.verb {
        Verb::Show => show(&mut stdout, &request, &replies, format, opts)?,
        Verb::IdGet => id_get(&mut stdout, &request, &replies, format, opts)?,
        Verb::Set => {}
    }
    stdout.flush()?;
    Ok(())
}

fn show<W: Write>(
    w: &mut W,
    request: &Request,
    replies: &[GenlMessage],
    format: OutputFormat,
    opts: &OutputOptions,
) -> Result<()> {
    let object = request.object;

    if !request.dump {
        // A targeted get answers with exactly one object
        let Some(reply) = replies.first() else {
            return Ok(());
        };
        let record = decode(object.table(), &reply.attrs)?;
        render(&record, object.script())?.print(w, format, opts)?;
        return Ok(());
    }

    // A bad entry is reported after the rest of the dump is printed
    let mut first_error = None;
    let mut items = Vec::with_capacity(replies.len());
    for reply in replies {
        let rendered = decode(object.table(), &reply.attrs)
            .and_then(|record| render(&record, object.script()));
        match rendered {
            Ok(rendered) => items.push(rendered),
            Err(e) => {
                tracing::warn!(error = %e, "skipping undecodable {} entry", object);
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    RecordList { object, items }.print(w, format, opts)?;

    match first_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

#[derive(Serialize)]
struct IdReply {
    id: u32,
}

fn id_get<W: Write>(
    w: &mut W,
    request: &Request,
    replies: &[GenlMessage],
    format: OutputFormat,
    opts: &OutputOptions,
) -> Result<()> {
    let id_attr = match request.object {
        Object::Device => DpllAttr::Id as u16,
        Object::Pin => DpllPinAttr::Id as u16,
    };

    let mut id = None;
    if let Some(reply) = replies.first() {
        id = decode(request.object.table(), &reply.attrs)?.u32(id_attr);
    }
    let Some(id) = id else {
        bail!("{} id missing from reply", request.object);
    };

    match format {
        OutputFormat::Text => writeln!(w, "{}", id)?,
        OutputFormat::Json => write_json(w, &serde_json::to_value(IdReply { id })?, opts)?,
    }
    Ok(())
}
