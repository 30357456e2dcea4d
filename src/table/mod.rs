pub mod csv_table;
