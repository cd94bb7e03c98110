//! The validation kernel.
//!
//! One recursive pass applies a schema node to an instance value. Keyword
//! failures accumulate so a single call surfaces as many distinct problems
//! as possible; the only early exits are unconditional schemas, a type
//! mismatch, a failing reference, and the second `oneOf` winner.
//!
//! Alongside the pass/fail outcome every call computes which properties and
//! items it evaluated. Combinators merge that bookkeeping from successful
//! children, which is what `unevaluatedProperties`/`unevaluatedItems` see.

use crate::{
    error::{ValidationError, ValidationErrorKind},
    helpers,
    paths::{escape, InstancePath},
    primitive_type::PrimitiveType,
    rational::{self, LazyFraction},
    schema::{Additional, Dependency, ExtensionContext, Items, Schema, SchemaRef, Schemas},
};
use ahash::AHashSet;
use serde_json::Value;
use std::borrow::Cow;

/// What one validation call evaluated, reported only on success.
pub(crate) struct Evaluated<'v> {
    /// Property names of the current object nobody has evaluated yet.
    props: AHashSet<&'v str>,
    /// Highest evaluated array index.
    last_item: Option<usize>,
}

impl<'v> Evaluated<'v> {
    fn new(instance: &'v Value) -> Evaluated<'v> {
        let props = if let Value::Object(object) = instance {
            object.keys().map(String::as_str).collect()
        } else {
            AHashSet::new()
        };
        Evaluated {
            props,
            last_item: None,
        }
    }

    /// Fold a successful child's bookkeeping into this scope: anything the
    /// child evaluated counts as evaluated here too.
    fn merge(&mut self, child: &Evaluated<'v>) {
        self.last_item = self.last_item.max(child.last_item);
        self.props.retain(|name| child.props.contains(name));
    }
}

pub(crate) fn validate_root(
    schemas: &Schemas,
    schema: SchemaRef,
    instance: &Value,
) -> Result<(), ValidationError> {
    let path = InstancePath::new();
    validate(schemas, &schemas[schema], instance, &path).map(|_| ())
}

/// Build an error for a keyword of `schema`. Composite tags such as
/// `allOf/1` pass through as-is; the empty tag points at the node itself.
fn keyword_error(
    schema: &Schema,
    path: &InstancePath<'_, '_>,
    keyword: impl Into<Cow<'static, str>>,
    kind: ValidationErrorKind,
) -> ValidationError {
    let keyword = keyword.into();
    let schema_path = if keyword.is_empty() {
        schema.pointer.clone()
    } else {
        format!("{}/{}", schema.pointer, keyword)
    };
    ValidationError::new(keyword, kind, path.to_pointer(), schema_path)
}

/// Validate the same instance against a child schema on behalf of a
/// combinator, merging the child's evaluation bookkeeping on success.
fn validate_with<'v>(
    schemas: &Schemas,
    sub: SchemaRef,
    instance: &'v Value,
    path: &InstancePath<'_, '_>,
    eval: &mut Evaluated<'v>,
) -> Result<(), ValidationError> {
    let child = validate(schemas, &schemas[sub], instance, path)?;
    eval.merge(&child);
    Ok(())
}

fn validate<'v>(
    schemas: &Schemas,
    schema: &Schema,
    instance: &'v Value,
    path: &InstancePath<'_, '_>,
) -> Result<Evaluated<'v>, ValidationError> {
    let mut eval = Evaluated::new(instance);

    if let Some(always) = schema.always {
        if !always {
            return Err(keyword_error(
                schema,
                path,
                "",
                ValidationErrorKind::FalseSchema,
            ));
        }
        return Ok(eval);
    }

    if !schema.types.is_empty() {
        let actual = PrimitiveType::from(instance);
        let matched = schema.types.contains(actual)
            || match instance {
                // "integer" admits any number that is mathematically
                // integral, so 3.0 and 3e0 qualify.
                Value::Number(number) => {
                    schema.types.contains(PrimitiveType::Integer) && rational::is_integral(number)
                }
                _ => false,
            };
        if !matched {
            return Err(keyword_error(
                schema,
                path,
                "type",
                ValidationErrorKind::Type {
                    expected: schema.types,
                    actual,
                },
            ));
        }
    }

    let mut errors = Vec::new();

    if let Some(constant) = &schema.constant {
        if !helpers::equal(instance, constant) {
            errors.push(keyword_error(
                schema,
                path,
                "const",
                ValidationErrorKind::Constant {
                    expected: constant.clone(),
                },
            ));
        }
    }

    if !schema.enum_values.is_empty()
        && !schema
            .enum_values
            .iter()
            .any(|option| helpers::equal(instance, option))
    {
        errors.push(keyword_error(
            schema,
            path,
            "enum",
            ValidationErrorKind::Enum {
                options: schema.enum_values.clone(),
            },
        ));
    }

    if let Some(format) = &schema.format {
        if !(format.check)(instance) {
            errors.push(keyword_error(
                schema,
                path,
                "format",
                ValidationErrorKind::Format {
                    format: format.name.clone(),
                },
            ));
        }
    }

    match instance {
        Value::Object(object) => {
            if let Some(limit) = schema.min_properties {
                if object.len() < limit {
                    errors.push(keyword_error(
                        schema,
                        path,
                        "minProperties",
                        ValidationErrorKind::MinProperties {
                            limit,
                            found: object.len(),
                        },
                    ));
                }
            }
            if let Some(limit) = schema.max_properties {
                if object.len() > limit {
                    errors.push(keyword_error(
                        schema,
                        path,
                        "maxProperties",
                        ValidationErrorKind::MaxProperties {
                            limit,
                            found: object.len(),
                        },
                    ));
                }
            }

            let missing: Vec<String> = schema
                .required
                .iter()
                .filter(|name| !object.contains_key(*name))
                .cloned()
                .collect();
            if !missing.is_empty() {
                errors.push(keyword_error(
                    schema,
                    path,
                    "required",
                    ValidationErrorKind::Required { missing },
                ));
            }

            for (name, sub) in &schema.properties {
                if let Some(value) = object.get(name) {
                    // Evaluated whether or not the subschema accepts it.
                    eval.props.remove(name.as_str());
                    let child_path = path.push(name.as_str());
                    if let Err(error) = validate(schemas, &schemas[*sub], value, &child_path) {
                        errors.push(error);
                    }
                }
            }

            if let Some(sub) = schema.property_names {
                for name in object.keys() {
                    let name_value = Value::String(name.clone());
                    let child_path = path.push(name.as_str());
                    match validate(schemas, &schemas[sub], &name_value, &child_path) {
                        Ok(_) => {}
                        Err(error) => errors.push(error),
                    }
                }
            }

            if schema.regex_properties {
                for name in object.keys() {
                    if fancy_regex::Regex::new(name).is_err() {
                        errors.push(keyword_error(
                            schema,
                            path,
                            "",
                            ValidationErrorKind::InvalidRegex {
                                pattern: name.clone(),
                            },
                        ));
                    }
                }
            }
            for (pattern, sub) in &schema.pattern_properties {
                for (name, value) in object {
                    match pattern.is_match(name) {
                        Ok(true) => {
                            eval.props.remove(name.as_str());
                            let child_path = path.push(name.as_str());
                            if let Err(error) =
                                validate(schemas, &schemas[*sub], value, &child_path)
                            {
                                errors.push(error);
                            }
                        }
                        Ok(false) => {}
                        Err(_) => errors.push(keyword_error(
                            schema,
                            path,
                            format!("patternProperties/{}", escape(pattern.as_str())),
                            ValidationErrorKind::BacktrackLimit {
                                pattern: pattern.as_str().to_string(),
                            },
                        )),
                    }
                }
            }

            match schema.additional_properties {
                Additional::Absent => {}
                Additional::Allow(allowed) => {
                    if !allowed && !eval.props.is_empty() {
                        let mut unexpected: Vec<String> =
                            eval.props.iter().map(|name| (*name).to_string()).collect();
                        unexpected.sort_unstable();
                        errors.push(keyword_error(
                            schema,
                            path,
                            "additionalProperties",
                            ValidationErrorKind::AdditionalProperties { unexpected },
                        ));
                    }
                    eval.props.clear();
                }
                Additional::Schema(sub) => {
                    let mut leftover: Vec<&str> = eval.props.iter().copied().collect();
                    leftover.sort_unstable();
                    for name in leftover {
                        if let Some(value) = object.get(name) {
                            let child_path = path.push(name);
                            if let Err(error) =
                                validate(schemas, &schemas[sub], value, &child_path)
                            {
                                errors.push(error);
                            }
                        }
                    }
                    eval.props.clear();
                }
            }

            for (name, dependency) in &schema.dependencies {
                if object.contains_key(name) {
                    match dependency {
                        Dependency::Schema(sub) => {
                            if let Err(error) =
                                validate_with(schemas, *sub, instance, path, &mut eval)
                            {
                                errors.push(error);
                            }
                        }
                        Dependency::Required(required) => {
                            for (idx, property) in required.iter().enumerate() {
                                if !object.contains_key(property) {
                                    errors.push(keyword_error(
                                        schema,
                                        path,
                                        format!("dependencies/{}/{idx}", escape(name)),
                                        ValidationErrorKind::DependentRequired {
                                            property: name.clone(),
                                            required: property.clone(),
                                        },
                                    ));
                                }
                            }
                        }
                    }
                }
            }
            for (name, required) in &schema.dependent_required {
                if object.contains_key(name) {
                    for (idx, property) in required.iter().enumerate() {
                        if !object.contains_key(property) {
                            errors.push(keyword_error(
                                schema,
                                path,
                                format!("dependentRequired/{}/{idx}", escape(name)),
                                ValidationErrorKind::DependentRequired {
                                    property: name.clone(),
                                    required: property.clone(),
                                },
                            ));
                        }
                    }
                }
            }
            for (name, sub) in &schema.dependent_schemas {
                if object.contains_key(name) {
                    if let Err(error) = validate_with(schemas, *sub, instance, path, &mut eval) {
                        errors.push(error);
                    }
                }
            }
        }
        Value::Array(items) => {
            if let Some(limit) = schema.min_items {
                if items.len() < limit {
                    errors.push(keyword_error(
                        schema,
                        path,
                        "minItems",
                        ValidationErrorKind::MinItems {
                            limit,
                            found: items.len(),
                        },
                    ));
                }
            }
            if let Some(limit) = schema.max_items {
                if items.len() > limit {
                    errors.push(keyword_error(
                        schema,
                        path,
                        "maxItems",
                        ValidationErrorKind::MaxItems {
                            limit,
                            found: items.len(),
                        },
                    ));
                }
            }

            if schema.unique_items {
                'outer: for second in 1..items.len() {
                    for first in 0..second {
                        if helpers::equal(&items[first], &items[second]) {
                            errors.push(keyword_error(
                                schema,
                                path,
                                "uniqueItems",
                                ValidationErrorKind::UniqueItems { first, second },
                            ));
                            break 'outer;
                        }
                    }
                }
            }

            match &schema.items {
                Items::Absent => {}
                Items::Single(sub) => {
                    for (idx, item) in items.iter().enumerate() {
                        let child_path = path.push(idx);
                        if let Err(error) = validate(schemas, &schemas[*sub], item, &child_path) {
                            errors.push(error);
                        }
                    }
                    eval.last_item = items.len().checked_sub(1);
                }
                Items::Tuple(subs) => {
                    if let Additional::Allow(false) = schema.additional_items {
                        if items.len() > subs.len() {
                            errors.push(keyword_error(
                                schema,
                                path,
                                "additionalItems",
                                ValidationErrorKind::AdditionalItems {
                                    limit: subs.len(),
                                    found: items.len(),
                                },
                            ));
                        }
                    }
                    for (idx, item) in items.iter().enumerate() {
                        if let Some(sub) = subs.get(idx) {
                            let child_path = path.push(idx);
                            if let Err(error) =
                                validate(schemas, &schemas[*sub], item, &child_path)
                            {
                                errors.push(error);
                            }
                            eval.last_item = Some(idx);
                        } else if let Additional::Schema(sub) = schema.additional_items {
                            let child_path = path.push(idx);
                            if let Err(error) = validate(schemas, &schemas[sub], item, &child_path)
                            {
                                errors.push(error);
                            }
                            eval.last_item = Some(idx);
                        } else {
                            break;
                        }
                    }
                    if let Additional::Allow(true) = schema.additional_items {
                        eval.last_item = items.len().checked_sub(1);
                    }
                }
            }

            if let Some(sub) = schema.contains {
                let mut matched = 0_usize;
                let mut causes = Vec::new();
                for (idx, item) in items.iter().enumerate() {
                    let child_path = path.push(idx);
                    match validate(schemas, &schemas[sub], item, &child_path) {
                        Ok(_) => matched += 1,
                        Err(error) => causes.push(error),
                    }
                }
                if matched < schema.min_contains {
                    errors.push(
                        keyword_error(
                            schema,
                            path,
                            "minContains",
                            ValidationErrorKind::MinContains {
                                limit: schema.min_contains,
                                matched,
                            },
                        )
                        .with_causes(causes),
                    );
                }
                if let Some(limit) = schema.max_contains {
                    if matched > limit {
                        errors.push(keyword_error(
                            schema,
                            path,
                            "maxContains",
                            ValidationErrorKind::MaxContains { limit, matched },
                        ));
                    }
                }
            }
        }
        Value::String(string) => {
            if schema.min_length.is_some() || schema.max_length.is_some() {
                // Code points, not bytes: "€" has length 1.
                let length = bytecount::num_chars(string.as_bytes());
                if let Some(limit) = schema.min_length {
                    if length < limit {
                        errors.push(keyword_error(
                            schema,
                            path,
                            "minLength",
                            ValidationErrorKind::MinLength {
                                limit,
                                found: length,
                            },
                        ));
                    }
                }
                if let Some(limit) = schema.max_length {
                    if length > limit {
                        errors.push(keyword_error(
                            schema,
                            path,
                            "maxLength",
                            ValidationErrorKind::MaxLength {
                                limit,
                                found: length,
                            },
                        ));
                    }
                }
            }

            if let Some(pattern) = &schema.pattern {
                match pattern.is_match(string) {
                    Ok(true) => {}
                    Ok(false) => errors.push(keyword_error(
                        schema,
                        path,
                        "pattern",
                        ValidationErrorKind::Pattern {
                            pattern: pattern.as_str().to_string(),
                        },
                    )),
                    Err(_) => errors.push(keyword_error(
                        schema,
                        path,
                        "pattern",
                        ValidationErrorKind::BacktrackLimit {
                            pattern: pattern.as_str().to_string(),
                        },
                    )),
                }
            }

            let mut content: Option<Vec<u8>> = None;
            let mut decoded = schema.content_encoding.is_none();
            if let Some(encoding) = &schema.content_encoding {
                match (encoding.decode)(string) {
                    Ok(bytes) => {
                        content = Some(bytes);
                        decoded = true;
                    }
                    Err(_) => errors.push(keyword_error(
                        schema,
                        path,
                        "contentEncoding",
                        ValidationErrorKind::ContentEncoding {
                            encoding: encoding.name.clone(),
                        },
                    )),
                }
            }
            if decoded {
                if let Some(media_type) = &schema.content_media_type {
                    let bytes = content.as_deref().unwrap_or(string.as_bytes());
                    if (media_type.check)(bytes).is_err() {
                        errors.push(keyword_error(
                            schema,
                            path,
                            "contentMediaType",
                            ValidationErrorKind::ContentMediaType {
                                media_type: media_type.name.clone(),
                            },
                        ));
                    }
                }
            }
        }
        Value::Number(number) => {
            // One conversion at most, and only when a bound is present.
            let mut num = LazyFraction::new(number);
            if let Some(limit) = &schema.minimum {
                if num.get() < limit {
                    errors.push(keyword_error(
                        schema,
                        path,
                        "minimum",
                        ValidationErrorKind::Minimum {
                            limit: limit.clone(),
                        },
                    ));
                }
            }
            if let Some(limit) = &schema.exclusive_minimum {
                if num.get() <= limit {
                    errors.push(keyword_error(
                        schema,
                        path,
                        "exclusiveMinimum",
                        ValidationErrorKind::ExclusiveMinimum {
                            limit: limit.clone(),
                        },
                    ));
                }
            }
            if let Some(limit) = &schema.maximum {
                if num.get() > limit {
                    errors.push(keyword_error(
                        schema,
                        path,
                        "maximum",
                        ValidationErrorKind::Maximum {
                            limit: limit.clone(),
                        },
                    ));
                }
            }
            if let Some(limit) = &schema.exclusive_maximum {
                if num.get() >= limit {
                    errors.push(keyword_error(
                        schema,
                        path,
                        "exclusiveMaximum",
                        ValidationErrorKind::ExclusiveMaximum {
                            limit: limit.clone(),
                        },
                    ));
                }
            }
            if let Some(multiple_of) = &schema.multiple_of {
                let quotient = num.get().clone() / multiple_of.clone();
                if !rational::is_integer(&quotient) {
                    errors.push(keyword_error(
                        schema,
                        path,
                        "multipleOf",
                        ValidationErrorKind::MultipleOf {
                            multiple_of: multiple_of.clone(),
                        },
                    ));
                }
            }
        }
        Value::Null | Value::Bool(_) => {}
    }

    if let Some(target) = schema.reference {
        if let Err(error) = validate_with(schemas, target, instance, path, &mut eval) {
            let reference = schemas[target].location(schema);
            return Err(keyword_error(
                schema,
                path,
                "$ref",
                ValidationErrorKind::Reference { reference },
            )
            .with_cause(error));
        }
    }

    if let Some(sub) = schema.not {
        // The result of a successful `not` subschema is dropped on the
        // floor: its evaluations never propagate.
        if validate(schemas, &schemas[sub], instance, path).is_ok() {
            errors.push(keyword_error(schema, path, "not", ValidationErrorKind::Not));
        }
    }

    for (idx, sub) in schema.all_of.iter().enumerate() {
        if let Err(error) = validate_with(schemas, *sub, instance, path, &mut eval) {
            errors.push(
                keyword_error(schema, path, format!("allOf/{idx}"), ValidationErrorKind::AllOf)
                    .with_cause(error),
            );
        }
    }

    if !schema.any_of.is_empty() {
        let mut matched = false;
        let mut causes = Vec::new();
        // Every subschema runs so each success contributes evaluations.
        for sub in &schema.any_of {
            match validate_with(schemas, *sub, instance, path, &mut eval) {
                Ok(()) => matched = true,
                Err(error) => causes.push(error),
            }
        }
        if !matched {
            errors.push(
                keyword_error(schema, path, "anyOf", ValidationErrorKind::AnyOf)
                    .with_causes(causes),
            );
        }
    }

    if !schema.one_of.is_empty() {
        let mut matched: Option<usize> = None;
        let mut causes = Vec::new();
        for (idx, sub) in schema.one_of.iter().enumerate() {
            match validate_with(schemas, *sub, instance, path, &mut eval) {
                Ok(()) => {
                    if let Some(first) = matched {
                        errors.push(keyword_error(
                            schema,
                            path,
                            "oneOf",
                            ValidationErrorKind::OneOfMultipleValid { first, second: idx },
                        ));
                        break;
                    }
                    matched = Some(idx);
                }
                Err(error) => causes.push(error),
            }
        }
        if matched.is_none() {
            errors.push(
                keyword_error(schema, path, "oneOf", ValidationErrorKind::OneOfNotValid)
                    .with_causes(causes),
            );
        }
    }

    if let Some(conditional) = &schema.conditional {
        if validate_with(schemas, conditional.if_schema, instance, path, &mut eval).is_ok() {
            if let Some(then) = conditional.then {
                if let Err(error) = validate_with(schemas, then, instance, path, &mut eval) {
                    errors.push(
                        keyword_error(schema, path, "then", ValidationErrorKind::Then)
                            .with_cause(error),
                    );
                }
            }
        } else if let Some(else_schema) = conditional.else_schema {
            if let Err(error) = validate_with(schemas, else_schema, instance, path, &mut eval) {
                errors.push(
                    keyword_error(schema, path, "else", ValidationErrorKind::Else)
                        .with_cause(error),
                );
            }
        }
    }

    match instance {
        Value::Object(object) => {
            if let Some(sub) = schema.unevaluated_properties {
                let mut leftover: Vec<&str> = eval.props.iter().copied().collect();
                leftover.sort_unstable();
                for name in leftover {
                    if let Some(value) = object.get(name) {
                        let child_path = path.push(name);
                        if let Err(error) = validate(schemas, &schemas[sub], value, &child_path) {
                            errors.push(error);
                        }
                    }
                }
                eval.props.clear();
            }
        }
        Value::Array(items) => {
            if let Some(sub) = schema.unevaluated_items {
                let start = eval.last_item.map_or(0, |last| last + 1);
                for (idx, item) in items.iter().enumerate().skip(start) {
                    let child_path = path.push(idx);
                    if let Err(error) = validate(schemas, &schemas[sub], item, &child_path) {
                        errors.push(error);
                    }
                }
                eval.last_item = items.len().checked_sub(1);
            }
        }
        _ => {}
    }

    for extension in &schema.extensions {
        if let Err(error) =
            extension
                .validator
                .validate(&ExtensionContext::default(), &extension.config, instance)
        {
            errors.push(error);
        }
    }

    if errors.is_empty() {
        Ok(eval)
    } else if errors.len() == 1 {
        Err(errors.remove(0))
    } else {
        Err(keyword_error(schema, path, "", ValidationErrorKind::Group).with_causes(errors))
    }
}
