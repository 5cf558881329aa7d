mod reads;
mod scenarios;
