//! Type syntax (spec §6): `void`, `number`, `string`, a tuple prefix
//! `[T1, T2, ...]`, and the postfix forms `T[]` (array) and `R(T [&], ...)`
//! (function type), the latter two applicable to any already-parsed type
//! and to each other in sequence (`number()[]` is an array of functions).

use sl_data::{Keyword, Operator, ParsingError, TokenValue};
use sl_types::TypeHandle;

use crate::context::CompilerContext;
use crate::cursor::Cursor;

pub fn parse_type(cursor: &mut Cursor, ctx: &mut CompilerContext) -> Result<TypeHandle, ParsingError> {
    let mut handle = parse_base_type(cursor, ctx)?;
    loop {
        if cursor.check(&TokenValue::Operator(Operator::OpenSquare)) {
            let span = cursor.span();
            cursor.advance();
            cursor.expect_value(&TokenValue::Operator(Operator::CloseSquare)).map_err(|_| ParsingError::syntax("Array type must be written 'T[]'", span))?;
            handle = ctx.types.array(handle);
            continue;
        }
        if cursor.check(&TokenValue::Operator(Operator::OpenRound)) {
            cursor.advance();
            let params = parse_function_type_params(cursor, ctx)?;
            cursor.expect_value(&TokenValue::Operator(Operator::CloseRound))?;
            handle = ctx.types.function(handle, params);
            continue;
        }
        break;
    }
    return Ok(handle);
}

fn parse_base_type(cursor: &mut Cursor, ctx: &mut CompilerContext) -> Result<TypeHandle, ParsingError> {
    let span = cursor.span();
    return match cursor.peek().value.clone() {
        TokenValue::Keyword(Keyword::Void) => {
            cursor.advance();
            Ok(ctx.types.void())
        }
        TokenValue::Keyword(Keyword::Number) => {
            cursor.advance();
            Ok(ctx.types.number())
        }
        TokenValue::Keyword(Keyword::String) => {
            cursor.advance();
            Ok(ctx.types.string())
        }
        TokenValue::Operator(Operator::OpenSquare) => {
            cursor.advance();
            let mut elements = Vec::new();
            loop {
                elements.push(parse_type(cursor, ctx)?);
                if cursor.check(&TokenValue::Operator(Operator::Comma)) {
                    cursor.advance();
                    continue;
                }
                break;
            }
            cursor.expect_value(&TokenValue::Operator(Operator::CloseSquare))?;
            Ok(ctx.types.tuple(elements))
        }
        other => Err(ParsingError::syntax(format!("Expected a type, found '{}'", other), span)),
    };
}

fn parse_function_type_params(cursor: &mut Cursor, ctx: &mut CompilerContext) -> Result<Vec<(TypeHandle, bool)>, ParsingError> {
    let mut params = Vec::new();
    if cursor.check(&TokenValue::Operator(Operator::CloseRound)) {
        return Ok(params);
    }
    loop {
        let param_type = parse_type(cursor, ctx)?;
        let by_ref = cursor.check(&TokenValue::Operator(Operator::BitwiseAnd));
        if by_ref {
            cursor.advance();
        }
        params.push((param_type, by_ref));
        if cursor.check(&TokenValue::Operator(Operator::Comma)) {
            cursor.advance();
            continue;
        }
        break;
    }
    return Ok(params);
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tokenizer::tokenize;
    use sl_types::Type;

    fn parse(source: &str) -> (TypeHandle, CompilerContext) {
        let mut ctx = CompilerContext::new();
        let tokens = tokenize(source).unwrap();
        let mut cursor = Cursor::new(&tokens);
        let handle = parse_type(&mut cursor, &mut ctx).unwrap();
        return (handle, ctx);
    }

    #[test]
    fn array_of_numbers() {
        let (handle, ctx) = parse("number[]");
        assert_eq!(ctx.types.get(handle), &Type::Array(ctx.types.number()));
    }

    #[test]
    fn tuple_of_number_and_string() {
        let (handle, ctx) = parse("[number, string]");
        assert_eq!(ctx.types.get(handle), &Type::Tuple(vec![ctx.types.number(), ctx.types.string()]));
    }

    #[test]
    fn function_type_with_a_by_reference_parameter() {
        let (handle, ctx) = parse("number(string&)");
        assert_eq!(ctx.types.get(handle), &Type::Function { ret: ctx.types.number(), params: vec![(ctx.types.string(), true)] });
    }
}
