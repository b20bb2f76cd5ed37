mod all_test;
mod arithmetic_test;
mod array_test;
mod key_value_test;
