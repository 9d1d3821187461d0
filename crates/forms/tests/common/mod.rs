//! Shared models, rule sets and wiring for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use fieldwise::{
    DispatchConfig, EditContext, FormValidator, Services, ValidatorDefinition,
    add_form_validation, definition,
};
use fieldwise_core::{FieldValue, Handle, Model, ModelCatalog, SchemaBuilder};
use fieldwise_rules::prelude::*;

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct Student {
    pub first_name: String,
    pub last_name: String,
    pub grade: i32,
}

impl Model for Student {
    fn describe(schema: &mut SchemaBuilder<Self>) {
        schema
            .scalar("FirstName", |s| s.first_name.as_str().into())
            .setter("FirstName", |s, v| {
                s.first_name = v.try_into()?;
                Ok(())
            })
            .scalar("LastName", |s| s.last_name.as_str().into())
            .setter("LastName", |s, v| {
                s.last_name = v.try_into()?;
                Ok(())
            })
            .scalar("Grade", |s| s.grade.into())
            .setter("Grade", |s, v| {
                s.grade = v.try_into()?;
                Ok(())
            });
    }
}

#[derive(Debug, Default)]
pub struct Address {
    pub line1: String,
    pub city: String,
    pub postcode: String,
}

impl Model for Address {
    fn describe(schema: &mut SchemaBuilder<Self>) {
        schema
            .scalar("Line1", |a| a.line1.as_str().into())
            .setter("Line1", |a, v| {
                a.line1 = v.try_into()?;
                Ok(())
            })
            .scalar("City", |a| a.city.as_str().into())
            .scalar("Postcode", |a| a.postcode.as_str().into());
    }
}

#[derive(Default)]
pub struct Customer {
    pub first_name: String,
    pub last_name: String,
    pub address1: Handle<Address>,
    pub address2: Option<Handle<Address>>,
}

impl Model for Customer {
    fn describe(schema: &mut SchemaBuilder<Self>) {
        schema
            .scalar("FirstName", |c| c.first_name.as_str().into())
            .scalar("LastName", |c| c.last_name.as_str().into())
            .object("Address1", |c| (&c.address1).into())
            .object("Address2", |c| c.address2.as_ref().into());
    }
}

#[derive(Default)]
pub struct LineItem {
    pub name: String,
    pub quantity: i32,
}

impl Model for LineItem {
    fn describe(schema: &mut SchemaBuilder<Self>) {
        schema
            .scalar("Name", |i| i.name.as_str().into())
            .scalar("Quantity", |i| i.quantity.into());
    }
}

#[derive(Default)]
pub struct Order {
    pub reference: String,
    pub items: Vec<Option<Handle<LineItem>>>,
    pub lookup: Vec<(String, Handle<LineItem>)>,
}

impl Model for Order {
    fn describe(schema: &mut SchemaBuilder<Self>) {
        schema
            .scalar("Reference", |o| o.reference.as_str().into())
            .collection("Items", |o| FieldValue::list(o.items.iter().map(Option::as_ref)))
            .keyed("Lookup", |o| {
                FieldValue::map(o.lookup.iter().map(|(key, item)| (key.clone(), item)))
            });
    }
}

/// A linked node; `next` may point back into the chain.
#[derive(Default)]
pub struct Node {
    pub label: String,
    pub next: Option<Handle<Node>>,
    pub children: Vec<Handle<Node>>,
}

impl Model for Node {
    fn describe(schema: &mut SchemaBuilder<Self>) {
        schema
            .scalar("Label", |n| n.label.as_str().into())
            .object("Next", |n| n.next.as_ref().into())
            .collection("Children", |n| FieldValue::list(n.children.iter()));
    }
}

pub fn catalog() -> ModelCatalog {
    ModelCatalog::builder()
        .register::<Student>()
        .register::<Address>()
        .register::<Customer>()
        .register::<LineItem>()
        .register::<Order>()
        .register::<Node>()
        .build()
        .unwrap()
}

// ---------------------------------------------------------------------------
// Rule sets
// ---------------------------------------------------------------------------

pub fn student_rules() -> Arc<RuleSet<Student>> {
    Arc::new(
        RuleSet::new("student")
            .rule(
                Rule::new("FirstName", |s: &Student| s.first_name.as_str())
                    .check(not_empty())
                    .check(max_length(50)),
            )
            .rule(
                Rule::new("LastName", |s: &Student| s.last_name.as_str())
                    .check(not_empty())
                    .check(max_length(50)),
            )
            .rule(Rule::new("Grade", |s: &Student| &s.grade).check(exclusive_between(1, 12))),
    )
}

pub fn address_rules() -> Arc<RuleSet<Address>> {
    Arc::new(
        RuleSet::new("address")
            .rule(Rule::new("Line1", |a: &Address| a.line1.as_str()).check(not_empty()))
            .rule(Rule::new("City", |a: &Address| a.city.as_str()).check(not_empty()))
            .rule(
                Rule::new("Postcode", |a: &Address| a.postcode.as_str())
                    .check(not_empty())
                    .check(max_length(10)),
            ),
    )
}

pub fn customer_rules() -> Arc<RuleSet<Customer>> {
    let address = address_rules();
    Arc::new(
        RuleSet::new("customer")
            .rule(Rule::new("FirstName", |c: &Customer| c.first_name.as_str()).check(not_empty()))
            .rule(Rule::new("LastName", |c: &Customer| c.last_name.as_str()).check(not_empty()))
            .nested("Address1", |c| Some(c.address1.clone()), Arc::clone(&address))
            .nested("Address2", |c| c.address2.clone(), address),
    )
}

pub fn line_item_rules() -> Arc<RuleSet<LineItem>> {
    Arc::new(
        RuleSet::new("line_item")
            .rule(Rule::new("Name", |i: &LineItem| i.name.as_str()).check(not_empty()))
            .rule(
                Rule::new("Quantity", |i: &LineItem| &i.quantity).check(inclusive_between(1, 99)),
            ),
    )
}

pub fn order_rules() -> Arc<RuleSet<Order>> {
    Arc::new(
        RuleSet::new("order")
            .rule(Rule::new("Reference", |o: &Order| o.reference.as_str()).check(not_empty()))
            .each("Items", |o| o.items.clone(), line_item_rules()),
    )
}

/// One definition per model type with rules.
pub fn definitions() -> Vec<Box<dyn ValidatorDefinition>> {
    vec![
        definition("student", |_| Ok(student_rules())),
        definition("address", |_| Ok(address_rules())),
        definition("customer", |_| Ok(customer_rules())),
        definition("line_item", |_| Ok(line_item_rules())),
        definition("order", |_| Ok(order_rules())),
    ]
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

/// Services with rule validation enabled for `definitions`.
pub fn services_with(
    config: DispatchConfig,
    definitions: Vec<Box<dyn ValidatorDefinition>>,
) -> Arc<Services> {
    let mut services = Services::new();
    add_form_validation(&mut services, |setup| {
        setup
            .with_dispatch(config)?
            .add_rule_validation(catalog(), definitions)?;
        Ok(())
    })
    .unwrap();
    Arc::new(services)
}

pub fn services() -> Arc<Services> {
    services_with(DispatchConfig::default(), definitions())
}

/// Binds an edit context to `model` and attaches a form validator to it.
pub fn attach<T: Model>(
    services: &Arc<Services>,
    model: &Handle<T>,
) -> (Arc<EditContext>, FormValidator) {
    let ctx = Arc::new(EditContext::for_handle(model));
    let mut form = FormValidator::new(Arc::clone(services));
    form.set_edit_context(Some(Arc::clone(&ctx))).unwrap();
    (ctx, form)
}

pub fn invalid_student() -> Handle<Student> {
    Handle::new(Student {
        first_name: String::new(),
        last_name: "Doe".into(),
        grade: 15,
    })
}

pub fn valid_address() -> Handle<Address> {
    Handle::new(Address {
        line1: "1 High St".into(),
        city: "York".into(),
        postcode: "YO1 7HH".into(),
    })
}
