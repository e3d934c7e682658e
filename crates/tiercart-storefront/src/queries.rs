//! GraphQL documents for the Storefront cart API.
//!
//! Every document selects the full `CartFields` fragment so every operation
//! yields a complete cart.

macro_rules! cart_fields {
    () => {
        r"
fragment MoneyFields on MoneyV2 {
  amount
  currencyCode
}

fragment CartFields on Cart {
  id
  checkoutUrl
  totalQuantity
  createdAt
  updatedAt
  cost {
    subtotalAmount { ...MoneyFields }
    totalAmount { ...MoneyFields }
  }
  lines(first: 250) {
    nodes {
      id
      quantity
      cost {
        totalAmount { ...MoneyFields }
      }
      merchandise {
        __typename
        ... on ProductVariant {
          id
          title
          sku
          price { ...MoneyFields }
          compareAtPrice { ...MoneyFields }
          image { url }
          product {
            id
            handle
            title
            featuredImage { url }
          }
        }
      }
      sellingPlanAllocation {
        sellingPlan { id name }
        priceAdjustments {
          price { ...MoneyFields }
          compareAtPrice { ...MoneyFields }
          perDeliveryPrice { ...MoneyFields }
        }
      }
    }
  }
}
"
    };
}

macro_rules! user_errors {
    () => {
        "userErrors { field message code }"
    };
}

pub(crate) const CART_CREATE: &str = concat!(
    "mutation CartCreate($input: CartInput!) {\n",
    "  cartCreate(input: $input) { cart { ...CartFields } ",
    user_errors!(),
    " }\n}\n",
    cart_fields!()
);

pub(crate) const CART_LINES_ADD: &str = concat!(
    "mutation CartLinesAdd($cartId: ID!, $lines: [CartLineInput!]!) {\n",
    "  cartLinesAdd(cartId: $cartId, lines: $lines) { cart { ...CartFields } ",
    user_errors!(),
    " }\n}\n",
    cart_fields!()
);

pub(crate) const CART_LINES_UPDATE: &str = concat!(
    "mutation CartLinesUpdate($cartId: ID!, $lines: [CartLineUpdateInput!]!) {\n",
    "  cartLinesUpdate(cartId: $cartId, lines: $lines) { cart { ...CartFields } ",
    user_errors!(),
    " }\n}\n",
    cart_fields!()
);

pub(crate) const CART_LINES_REMOVE: &str = concat!(
    "mutation CartLinesRemove($cartId: ID!, $lineIds: [ID!]!) {\n",
    "  cartLinesRemove(cartId: $cartId, lineIds: $lineIds) { cart { ...CartFields } ",
    user_errors!(),
    " }\n}\n",
    cart_fields!()
);

pub(crate) const CART_QUERY: &str = concat!(
    "query Cart($cartId: ID!) {\n",
    "  cart(id: $cartId) { ...CartFields }\n}\n",
    cart_fields!()
);
