pub mod d3js;
