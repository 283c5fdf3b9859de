pub mod imeon;
