/// Two unit squares side by side sharing one arc, quantized with a transform.
/// In file coordinates: A = [10, 10.5] x [40, 42], B = [10.5, 11] x [40, 42].
pub const TWO_SQUARES_TOPOJSON: &str = r#"{
  "type": "Topology",
  "transform": { "scale": [0.5, 2], "translate": [10, 40] },
  "objects": {
    "test2": {
      "type": "GeometryCollection",
      "geometries": [
        { "type": "Polygon", "arcs": [[0, 1]], "properties": { "KAM8": "A", "NAME": "Alpha" } },
        { "type": "Polygon", "arcs": [[2, -1]], "properties": { "KAM8": "B", "NAME": "Beta" } }
      ]
    }
  },
  "arcs": [
    [[1, 0], [0, 1]],
    [[1, 1], [-1, 0], [0, -1], [1, 0]],
    [[1, 0], [1, 0], [0, 1], [-1, 0]]
  ]
}"#;

pub const SALES_CSV: &str = "\
Geolevel 1,Product,Somme de QTY,Somme de Value
A,Product 1,10,1000
A,Product 2,30,3000
A,Product 3,60,6000
B,Product 2,5,500
B,Product 1,15,1500
C,Product 1,1,10
";
