pub mod call_expression_ext;
pub mod expression_ext;
