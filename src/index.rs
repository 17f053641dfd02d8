//! Lookup tables built once per recompute

use std::collections::HashMap;

use crate::models::{Factory, FactoryId, Product};

/// Factories and their products by id, borrowed from the authored factory set.
pub struct FactoryIndex<'a> {
    factories: HashMap<FactoryId, FactoryEntry<'a>>,
}

struct FactoryEntry<'a> {
    products: HashMap<&'a str, &'a Product>,
}

impl<'a> FactoryIndex<'a> {
    /// On duplicate ids the first factory wins, and likewise for products.
    pub fn new(factories: &'a [Factory]) -> Self {
        let mut index = HashMap::with_capacity(factories.len());
        for factory in factories {
            index.entry(factory.id.clone()).or_insert_with(|| FactoryEntry {
                products: product_index(&factory.products)
                    .into_iter()
                    .map(|(id, i)| (id, &factory.products[i]))
                    .collect(),
            });
        }
        Self { factories: index }
    }

    pub fn contains(&self, id: &FactoryId) -> bool {
        self.factories.contains_key(id)
    }

    pub fn product(&self, factory: &FactoryId, part: &str) -> Option<&'a Product> {
        self.factories.get(factory)?.products.get(part).copied()
    }
}

/// Position of the first product building each part
pub fn product_index(products: &[Product]) -> HashMap<&str, usize> {
    let mut index = HashMap::with_capacity(products.len());
    for (i, product) in products.iter().enumerate() {
        index.entry(product.id.as_str()).or_insert(i);
    }
    index
}
