//! Human-readable type names for diagnostics arguments and trace output.

use crate::model::ElementModel;
use crate::types::{TypeData, TypeId};
use dres_common::limits::MAX_TYPE_DEPTH;
use dres_syntax::ParameterKind;
use std::fmt::Write;

pub fn display_type(model: &ElementModel, ty: TypeId) -> String {
    let mut out = String::new();
    write_type(model, ty, &mut out, 0);
    out
}

fn write_type(model: &ElementModel, ty: TypeId, out: &mut String, depth: usize) {
    if depth > MAX_TYPE_DEPTH {
        out.push_str("...");
        return;
    }
    match model.types.lookup(ty) {
        None | Some(TypeData::Dynamic) => out.push_str("dynamic"),
        Some(TypeData::Bottom) => out.push_str("bottom"),
        Some(TypeData::Void) => out.push_str("void"),
        Some(TypeData::TypeParameter { element }) => out.push_str(model.name(element)),
        Some(TypeData::Interface { element, args }) => {
            out.push_str(model.name(element));
            if !args.is_empty() {
                out.push('<');
                write_list(model, &args, out, depth);
                out.push('>');
            }
        }
        Some(TypeData::Function {
            params,
            return_type,
            ..
        }) => {
            out.push('(');
            let mut group: Option<ParameterKind> = None;
            for (i, param) in params.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                if group != Some(param.kind) {
                    match param.kind {
                        ParameterKind::Positional => out.push('['),
                        ParameterKind::Named => out.push('{'),
                        ParameterKind::Required => {}
                    }
                    group = Some(param.kind);
                }
                if param.kind == ParameterKind::Named {
                    let _ = write!(out, "{}: ", param.name);
                }
                write_type(model, param.ty, out, depth + 1);
            }
            match group {
                Some(ParameterKind::Positional) => out.push(']'),
                Some(ParameterKind::Named) => out.push('}'),
                _ => {}
            }
            out.push_str(") -> ");
            write_type(model, return_type, out, depth + 1);
        }
        Some(TypeData::Union(members)) => {
            out.push('{');
            write_list(model, &members, out, depth);
            out.push('}');
        }
    }
}

fn write_list(model: &ElementModel, types: &[TypeId], out: &mut String, depth: usize) {
    for (i, &ty) in types.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_type(model, ty, out, depth + 1);
    }
}
