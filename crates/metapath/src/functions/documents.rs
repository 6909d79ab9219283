//! Document access family: `doc`, `doc-available`, `resolve-uri`.

use url::Url;

use crate::item::{AtomicValue, Item, Sequence};
use crate::model::NodeItem;
use crate::runtime::{Error, ErrorKind, FunctionRegistry};

use super::{boolean_result, item_to_string, zero_or_one};

pub(super) fn register<N: NodeItem>(reg: &mut FunctionRegistry<N>) {
    reg.register("doc", 1, |ctx, args| {
        let Some(uri) = uri_argument(&args[0])? else {
            return Ok(Sequence::empty());
        };
        let resolved = resolve(&uri, ctx.static_ctx.base_uri())?;
        let Some(loader) = &ctx.dyn_ctx.document_loader else {
            return Err(Error::new(
                ErrorKind::DocumentResolution,
                "no document loader is configured",
            ));
        };
        tracing::debug!(uri = %resolved, "loading document");
        let node = loader.load(&resolved)?;
        Ok(Sequence::singleton(Item::Node(node)))
    });

    reg.register("doc-available", 1, |ctx, args| {
        let Some(uri) = uri_argument(&args[0])? else {
            return boolean_result(false);
        };
        let Ok(resolved) = resolve(&uri, ctx.static_ctx.base_uri()) else {
            return boolean_result(false);
        };
        let available = match &ctx.dyn_ctx.document_loader {
            Some(loader) => loader.is_available(&resolved),
            None => false,
        };
        boolean_result(available)
    });

    // resolve-uri($relative) / resolve-uri($relative, $base)
    reg.register_range("resolve-uri", 1, Some(2), |ctx, args| {
        let Some(relative) = uri_argument(&args[0])? else {
            return Ok(Sequence::empty());
        };
        let resolved = match args.get(1) {
            Some(base_seq) => {
                let base_text = item_to_string(base_seq)?;
                let base = Url::parse(&base_text).map_err(|e| {
                    Error::new(
                        ErrorKind::UriResolution,
                        format!("invalid base URI '{base_text}'"),
                    )
                    .with_source(e)
                })?;
                resolve(&relative, Some(&base))?
            }
            None => resolve(&relative, ctx.static_ctx.base_uri())?,
        };
        Ok(Sequence::from(AtomicValue::AnyUri(resolved.to_string())))
    });
}

fn uri_argument<N: NodeItem>(seq: &Sequence<N>) -> Result<Option<String>, Error> {
    match zero_or_one(seq, "a URI argument")? {
        None => Ok(None),
        Some(item) => Ok(Some(item.string_value()?)),
    }
}

/// Resolve a possibly-relative URI reference against a base. An absolute
/// reference stands alone; a relative one without a base is unresolvable.
fn resolve(reference: &str, base: Option<&Url>) -> Result<Url, Error> {
    if let Ok(url) = Url::parse(reference) {
        return Ok(url);
    }
    let Some(base) = base else {
        return Err(Error::new(
            ErrorKind::UriResolution,
            format!("no base URI available to resolve '{reference}'"),
        ));
    };
    base.join(reference).map_err(|e| {
        Error::new(
            ErrorKind::UriResolution,
            format!("cannot resolve '{reference}' against '{base}'"),
        )
        .with_source(e)
    })
}
