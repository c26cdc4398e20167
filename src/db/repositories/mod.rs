mod travelers;
