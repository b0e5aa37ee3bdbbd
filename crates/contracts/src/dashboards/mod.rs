pub mod d410_sales_overview;
pub mod d411_sales_heatmap;
